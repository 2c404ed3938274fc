use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    egs_merge::cli::run_choose_egs_to_merge(std::env::args().skip(1))
}
