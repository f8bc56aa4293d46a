use etw_fold::aggregator::metrics::{
    calculate_hot_stacks, calculate_sample_distribution, generate_text_summary,
};
use etw_fold::aggregator::{FoldedStack, StackAggregator};
use etw_fold::utils::config::TargetProcess;
use pretty_assertions::assert_eq;

fn node_aggregator() -> StackAggregator {
    let mut agg = StackAggregator::new(TargetProcess::parse("node.exe"));
    agg.add_thread_filter("Node.exe", "1234", "5");
    agg
}

fn sample(agg: &mut StackAggregator, frames: &[&str]) {
    for (index, symbol) in frames.iter().enumerate() {
        agg.add_frame("5", &(index + 1).to_string(), symbol);
    }
}

#[test]
fn test_fold_and_render() {
    let mut agg = node_aggregator();
    sample(&mut agg, &["node.exe!leaf", "node.exe!mid", "node.exe!root"]);
    sample(&mut agg, &["JavaScript!foo C:\\app\\a.js:3", "node.exe!root"]);
    sample(&mut agg, &["node.exe!leaf", "node.exe!mid", "node.exe!root"]);
    agg.finalize();

    assert_eq!(
        agg.render(),
        vec![
            "root;foo C:/app/a.js:3 1\r\n".to_string(),
            "root;mid;leaf 2\r\n".to_string(),
        ]
    );
    assert_eq!(agg.samples(), 3);
}

#[test]
fn test_unknown_leaf_closes_sample() {
    let mut agg = node_aggregator();
    sample(&mut agg, &["m!a", "m!b"]);
    agg.add_frame("5", "1", "\"Unknown\"!0x10");
    assert_eq!(agg.count("b;a"), Some(1));

    agg.add_frame("5", "2", "m!b");
    agg.finalize();
    assert_eq!(agg.count("b"), Some(1));
}

#[test]
fn test_thread_filter_is_per_target() {
    let mut agg = node_aggregator();
    assert!(!agg.add_thread_filter("chrome.exe", "1234", "6"));
    agg.add_frame("6", "1", "m!chrome");
    agg.finalize();
    assert!(agg.is_empty());
    assert!(agg.is_target_thread("5"));
    assert!(!agg.is_target_thread("6"));
}

#[test]
fn test_hot_stacks_from_aggregator() {
    let mut agg = node_aggregator();
    for _ in 0..3 {
        sample(&mut agg, &["m!hot", "m!main"]);
    }
    sample(&mut agg, &["m!cold", "m!main"]);
    agg.finalize();

    let stacks = agg.folded_stacks();
    let hot = calculate_hot_stacks(&stacks, agg.samples(), 1);
    assert_eq!(hot.len(), 1);
    assert_eq!(hot[0].stack, "main;hot");
    assert_eq!(hot[0].count, 3);
    assert_eq!(hot[0].percentage, 75.0);
}

#[test]
fn test_distribution() {
    let stacks = vec![
        FoldedStack::new("a;b;c".to_string(), 6),
        FoldedStack::new("a;b".to_string(), 3),
        FoldedStack::new("a".to_string(), 1),
    ];

    let dist = calculate_sample_distribution(&stacks);
    assert_eq!(dist.total_samples, 10);
    assert_eq!(dist.stack_count, 3);
    assert_eq!(dist.mean_samples_per_stack, 3);
    assert_eq!(dist.median_samples_per_stack, 3);
    assert_eq!(dist.top_10_percent_samples, 6);
    assert_eq!(dist.max_depth, 3);
    assert!(!dist.is_highly_concentrated());
}

#[test]
fn test_text_summary_truncates() {
    let stacks: Vec<FoldedStack> = (0..5)
        .map(|i| FoldedStack::new(format!("main;f{}", i), 5 - i))
        .collect();

    let summary = generate_text_summary(&stacks, 2, 15);
    assert!(summary.contains("main;f0"));
    assert!(summary.contains("main;f1"));
    assert!(!summary.contains("main;f2"));
    assert!(summary.contains("Showing top 2 of 5 unique stacks"));
}
