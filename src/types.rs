/// Utterance identifier taken from the leading field of an example key.
/// Example: `sp1.1-spk001-utt0003`
pub type UtteranceId = String;
/// Pre-augmentation utterance identity (the `utt2uniq` value).
/// Example: `spk001-utt0003`
pub type Identity = String;
/// Opaque storage reference for an example (second scp column).
/// Example: `exp/chain/egs/cegs.1.ark:10342`
pub type Location = String;
/// Dense group identifier assigned by the partitioner, starting at zero.
pub type GroupId = usize;
/// Dense identifier assigned to each distinct `Identity` by the contamination builder.
pub type IdentityIdx = usize;
/// Index of an example inside the decoded example arena.
pub type ExampleIdx = usize;
