mod common;

use std::{collections::BTreeSet, fs};

use common::{
    chunk, entity_class, level_file, sub_level, write_level, RecordingRenderer,
};
use swbf2_hierarchy::{
    logging::init_logging,
    pipeline::{run, RunOptions},
    render::{GraphvizRenderer, OutputFormat, RenderSettings},
    utils::temp_dir::TempDir,
};

fn options_for(tmp: &TempDir) -> RunOptions {
    RunOptions {
        files: vec![tmp.join("levels")],
        output_dir: tmp.join("PlotOut"),
        report_path: tmp.join("SWBF2RootClasses.txt"),
        ..RunOptions::default()
    }
}

/// Two archives whose classes resolve to RootA and RootB.  The derived class
/// in the second archive finds its base in the first one.
fn write_two_levels(tmp: &TempDir) {
    write_level(
        &tmp.join("levels").join("core.lvl"),
        &[("a_base", "RootA"), ("b_base", "RootB"), ("no_root", "")],
    );
    write_level(
        &tmp.join("levels").join("side.lvl"),
        &[("a_child", "a_base"), ("a_grandchild", "a_child"), ("b_child", "b_base")],
    );
    // Not a level; directory scans must ignore it.
    fs::write(tmp.join("levels").join("readme.txt"), "hello").unwrap();
}

fn report_lines(tmp: &TempDir) -> Vec<String> {
    fs::read_to_string(tmp.join("SWBF2RootClasses.txt"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_one_plot_per_discovered_root() {
    init_logging();
    let tmp = TempDir::new("swbf2-hierarchy-e2e-roots");
    write_two_levels(&tmp);

    let mut renderer = RecordingRenderer::default();
    let summary = run(&options_for(&tmp), &mut renderer).await.unwrap();

    assert_eq!(summary.levels_loaded, 2);
    assert_eq!(summary.classes, 6);
    assert!(summary.failed.is_empty());
    assert!(tmp.join("PlotOut").join("RootA.png").is_file());
    assert!(tmp.join("PlotOut").join("RootB.png").is_file());
    assert_eq!(fs::read_dir(tmp.join("PlotOut")).unwrap().count(), 2);

    let lines: BTreeSet<String> = report_lines(&tmp).into_iter().collect();
    assert_eq!(report_lines(&tmp).len(), 2);
    assert_eq!(
        lines,
        BTreeSet::from(["RootA".to_string(), "RootB".to_string()])
    );

    let (root, edges) = &renderer.rendered[0];
    assert_eq!(root, "RootA");
    let listing: Vec<String> = edges.iter().map(|(f, t)| format!("{} -> {}", f, t)).collect();
    insta::assert_snapshot!(listing.join("\n"), @r###"
    RootA -> a_base
    a_base -> a_child
    a_child -> a_grandchild
    "###);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_root_class_override() {
    init_logging();
    let tmp = TempDir::new("swbf2-hierarchy-e2e-override");
    write_two_levels(&tmp);

    let opts = RunOptions {
        root_classes: Some(vec!["RootA".to_string()]),
        ..options_for(&tmp)
    };
    let mut renderer = RecordingRenderer::default();
    let summary = run(&opts, &mut renderer).await.unwrap();

    assert_eq!(summary.roots, BTreeSet::from(["RootA".to_string()]));
    assert!(tmp.join("PlotOut").join("RootA.png").is_file());
    assert!(!tmp.join("PlotOut").join("RootB.png").exists());
    assert_eq!(report_lines(&tmp), vec!["RootA".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_recursive_scan_and_dot_output() {
    init_logging();
    let tmp = TempDir::new("swbf2-hierarchy-e2e-dot");
    write_level(
        &tmp.join("levels").join("nested").join("deep.lvl"),
        &[("rep_inf_ep3_rifleman", "rep_inf_default"), ("rep_inf_default", "soldier")],
    );

    // Without recursion the nested level is never seen.
    let mut renderer = GraphvizRenderer::new(RenderSettings {
        format: OutputFormat::Dot,
        ..RenderSettings::default()
    });
    let summary = run(&options_for(&tmp), &mut renderer).await.unwrap();
    assert_eq!(summary.levels_loaded, 0);
    assert!(summary.roots.is_empty());
    assert!(report_lines(&tmp).is_empty());

    let opts = RunOptions {
        recursive: true,
        ..options_for(&tmp)
    };
    let summary = run(&opts, &mut renderer).await.unwrap();
    assert_eq!(summary.levels_loaded, 1);
    let dot = fs::read_to_string(tmp.join("PlotOut").join("soldier.dot")).unwrap();
    assert!(dot.starts_with("strict digraph"), "{}", dot);
    assert!(dot.contains("\"rep_inf_ep3_rifleman\""));
    assert_eq!(report_lines(&tmp), vec!["soldier".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_broken_level_does_not_abort_run() {
    init_logging();
    let tmp = TempDir::new("swbf2-hierarchy-e2e-broken");
    write_level(&tmp.join("levels").join("good.lvl"), &[("walker_a", "walker")]);

    // A level whose second class claims far more bytes than exist.
    let mut body = entity_class("cannon_a", "cannon");
    body.extend_from_slice(b"entc");
    body.extend_from_slice(&1000u32.to_le_bytes());
    fs::write(tmp.join("levels").join("broken.lvl"), chunk(b"ucfb", &body)).unwrap();

    // Sub-levels nested far deeper than any real archive.
    let mut nested = entity_class("deep_a", "deep");
    for i in 0..1000 {
        nested = sub_level(i, &nested);
    }
    fs::write(tmp.join("levels").join("nested.lvl"), level_file(&[nested])).unwrap();

    // An explicitly named file is loaded whatever its extension.
    let explicit = tmp.join("extra.bin");
    write_level(&explicit, &[("soldier_a", "soldier")]);

    let opts = RunOptions {
        files: vec![tmp.join("levels"), explicit, tmp.join("missing.lvl")],
        ..options_for(&tmp)
    };
    let mut renderer = GraphvizRenderer::new(RenderSettings {
        format: OutputFormat::Json,
        ..RenderSettings::default()
    });
    let summary = run(&opts, &mut renderer).await.unwrap();

    assert_eq!(summary.levels_loaded, 2);
    assert_eq!(
        summary.roots,
        BTreeSet::from(["soldier".to_string(), "walker".to_string()])
    );
    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.join("PlotOut").join("walker.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["nodes"], serde_json::json!(["walker", "walker_a"]));
    assert_eq!(json["classes"]["walker_a"]["base_name"], "walker");
    assert_eq!(json["classes"]["walker_a"]["kind"], "GameObject");
    assert!(tmp.join("SWBF2RootClasses.txt").is_file());
}
