use std::collections::HashSet;

use egs_merge::{
    ContaminationGraph, DeterministicRng, Example, GroupId, GroupingConfig, GroupingError,
    IdentityResolver, Partition, PassthroughResolver, Selection, TableResolver, candidate_pool,
    partition_examples, select_heldout,
};

const VARIANTS: [&str; 3] = ["", "sp0.9-", "sp1.1-"];

fn chunk(utterance_id: &str, first_frame: u32) -> Example {
    Example {
        utterance_id: utterance_id.to_string(),
        first_frame,
        left_context: 40,
        num_frames: 150,
        right_context: 40,
        location: format!("cegs.ark:{utterance_id}/{first_frame}"),
    }
}

/// Speakers × utterances × speed-perturbed copies, with uneven chunk counts so
/// utterances straddle group boundaries.
fn augmented_corpus(speakers: usize, utts_per_speaker: usize) -> (Vec<Example>, TableResolver) {
    let mut examples = Vec::new();
    let mut pairs = Vec::new();
    for prefix in VARIANTS {
        for spk in 0..speakers {
            for utt in 0..utts_per_speaker {
                let uniq = format!("spk{spk:02}-utt{utt}");
                let utterance_id = format!("{prefix}{uniq}");
                let chunks = 2 + (spk * 7 + utt * 3) % 6;
                for c in 0..chunks {
                    examples.push(chunk(&utterance_id, (c * 150) as u32));
                }
                pairs.push((utterance_id, uniq));
            }
        }
    }
    let resolver = TableResolver::from_pairs(pairs).expect("consistent table");
    (examples, resolver)
}

fn config(num_heldout_groups: usize, proportion: f64, num_repeats: usize) -> GroupingConfig {
    GroupingConfig {
        chunks_per_spk: 4,
        num_repeats,
        heldout_data_selection_proportion: proportion,
        num_heldout_groups,
        seed: 17,
        strict_order: false,
    }
}

fn build(num_repeats: usize) -> (Partition, TableResolver, ContaminationGraph) {
    let (examples, resolver) = augmented_corpus(12, 4);
    let partition = partition_examples(examples, &config(1, 1.0, num_repeats)).unwrap();
    let graph = ContaminationGraph::build(&partition, &resolver);
    (partition, resolver, graph)
}

fn identities_of<R: IdentityResolver>(
    partition: &Partition,
    resolver: &R,
    group: GroupId,
) -> HashSet<String> {
    let group = partition.group(group).unwrap();
    partition
        .members(group)
        .map(|example| resolver.resolve(&example.utterance_id).to_string())
        .collect()
}

fn assert_disjoint_cover(selection: &Selection, total: usize) {
    let mut seen = HashSet::new();
    for id in selection
        .training
        .iter()
        .chain(&selection.heldout)
        .chain(&selection.matched)
        .chain(&selection.excluded_only)
    {
        assert!(seen.insert(*id), "group {id} appears in two partitions");
    }
    assert_eq!(seen.len(), total);
    assert_eq!(selection.total(), total);
}

#[test]
fn partitions_cover_all_groups_without_overlap() {
    for num_repeats in [1, 2, 4] {
        let (_, _, graph) = build(num_repeats);
        let mut rng = DeterministicRng::new(5);
        let selection =
            select_heldout(&graph, &config(10, 0.3, num_repeats), &mut rng).unwrap();
        assert_eq!(selection.heldout.len(), 10);
        assert_eq!(selection.matched.len(), 10);
        assert_disjoint_cover(&selection, graph.num_groups());
    }
}

#[test]
fn heldout_identities_never_reach_training() {
    for num_repeats in [1, 2] {
        let (partition, resolver, graph) = build(num_repeats);
        let mut rng = DeterministicRng::new(99);
        let selection =
            select_heldout(&graph, &config(12, 0.5, num_repeats), &mut rng).unwrap();

        let heldout_identities: HashSet<String> = selection
            .heldout
            .iter()
            .flat_map(|&g| identities_of(&partition, &resolver, g))
            .collect();
        for &g in &selection.training {
            let overlap: Vec<String> = identities_of(&partition, &resolver, g)
                .intersection(&heldout_identities)
                .cloned()
                .collect();
            assert!(
                overlap.is_empty(),
                "training group {g} leaks held-out identities {overlap:?}"
            );
        }
    }
}

#[test]
fn contamination_is_symmetric_and_matches_identity_overlap() {
    let (partition, resolver, graph) = build(2);
    for g in 0..graph.num_groups() {
        assert!(!graph.contaminators(g).contains(&g));
        for &other in graph.contaminators(g) {
            assert!(graph.contaminators(other).contains(&g));
        }
    }
    // Spot-check against a direct identity comparison.
    let ids: Vec<HashSet<String>> = (0..graph.num_groups())
        .map(|g| identities_of(&partition, &resolver, g))
        .collect();
    for a in (0..graph.num_groups()).step_by(7) {
        for b in 0..graph.num_groups() {
            let shares = a != b && !ids[a].is_disjoint(&ids[b]);
            assert_eq!(graph.contaminators(a).contains(&b), shares, "groups {a} and {b}");
        }
    }
}

#[test]
fn augmented_copies_contaminate_each_other() {
    let (partition, _, graph) = build(1);
    assert_eq!(graph.num_identities(), 12 * 4);
    // Without the table each variant is its own identity.
    let plain = ContaminationGraph::build(&partition, &PassthroughResolver);
    assert_eq!(plain.num_identities(), 12 * 4 * VARIANTS.len());
    let with_table: usize = graph.contamination_counts().iter().sum();
    let without_table: usize = plain.contamination_counts().iter().sum();
    assert!(with_table > without_table);
}

#[test]
fn same_seed_reproduces_selection() {
    let (_, _, graph) = build(2);
    let cfg = config(8, 0.2, 2);
    let first = select_heldout(&graph, &cfg, &mut DeterministicRng::new(cfg.seed)).unwrap();
    let second = select_heldout(&graph, &cfg, &mut DeterministicRng::new(cfg.seed)).unwrap();
    assert_eq!(first, second);

    let distinct: HashSet<Vec<GroupId>> = (0..6)
        .map(|seed| {
            select_heldout(&graph, &cfg, &mut DeterministicRng::new(seed))
                .unwrap()
                .heldout
        })
        .collect();
    assert!(distinct.len() > 1, "different seeds should vary the held-out subset");
}

#[test]
fn full_proportion_pool_is_every_group() {
    let (_, _, graph) = build(1);
    let mut pool = candidate_pool(&graph, &config(5, 1.0, 1));
    pool.sort_unstable();
    let all: Vec<GroupId> = (0..graph.num_groups()).collect();
    assert_eq!(pool, all);

    let small = candidate_pool(&graph, &config(5, 0.1, 1));
    let max_in_pool = small
        .iter()
        .map(|&g| graph.contamination_count(g))
        .max()
        .unwrap();
    let outside_min = (0..graph.num_groups())
        .filter(|g| !small.contains(g))
        .map(|g| graph.contamination_count(g))
        .min()
        .unwrap();
    assert!(max_in_pool <= outside_min);
}

#[test]
fn single_utterance_exact_group_is_clean() {
    let examples: Vec<Example> = (0..4).map(|i| chunk("lonely", i * 150)).collect();
    let partition = partition_examples(examples, &config(1, 1.0, 1)).unwrap();
    assert_eq!(partition.len(), 1);
    let graph = ContaminationGraph::build(&partition, &PassthroughResolver);
    assert!(graph.contaminators(0).is_empty());
}

#[test]
fn eight_and_nine_examples_make_two_groups() {
    for count in [8u32, 9] {
        let examples: Vec<Example> = (0..count).map(|i| chunk("u", i * 150)).collect();
        let partition = partition_examples(examples, &config(1, 1.0, 1)).unwrap();
        assert_eq!(partition.len(), 2, "{count} examples");
        let first: Vec<u32> = partition
            .members(&partition.groups[0])
            .map(|e| e.first_frame)
            .collect();
        let second: Vec<u32> = partition
            .members(&partition.groups[1])
            .map(|e| e.first_frame)
            .collect();
        assert_eq!(first, vec![0, 150, 300, 450]);
        assert_eq!(second, vec![600, 750, 900, 1050]);
    }
}

#[test]
fn non_dividing_repeats_are_rejected_before_grouping() {
    let (examples, _) = augmented_corpus(2, 2);
    let err = partition_examples(examples, &config(1, 1.0, 3)).unwrap_err();
    assert!(matches!(err, GroupingError::InvalidConfiguration(_)));
}

#[test]
fn more_heldout_groups_than_groups_is_insufficient() {
    let (_, _, graph) = build(1);
    let wanted = graph.num_groups() + 1;
    let err = select_heldout(&graph, &config(wanted, 1.0, 1), &mut DeterministicRng::new(0))
        .unwrap_err();
    match err {
        GroupingError::InsufficientData {
            needed, available, ..
        } => {
            assert_eq!(needed, wanted);
            assert_eq!(available, graph.num_groups());
        }
        other => panic!("unexpected error: {other}"),
    }
}
