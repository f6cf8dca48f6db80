use std::fs;
use std::path::Path;

use logic_graph::{NodeCategory, NodeRegistry, RuntimeSettings};
use skill::SkillId;
use skill::loaders::ContentLoader;

#[test]
fn bundled_content_loads() {
    let registry = NodeRegistry::with_builtins();
    let loader = ContentLoader::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"));
    let content = loader.load(&registry).unwrap();

    assert_eq!(content.settings, RuntimeSettings::default());
    assert_eq!(content.skills.len(), 3);
    assert_eq!(
        content.scripts.names().collect::<Vec<_>>(),
        ["barrier", "fireball", "mend"]
    );
    for skill in &content.skills {
        assert!(content.scripts.contains(&skill.script), "{}", skill.name);
    }

    let fireball = content.skill("Fireball").unwrap();
    assert_eq!(fireball.id, SkillId(1));
    assert_eq!(fireball.range, Some(8.0));
    let script = content.scripts.get("fireball").unwrap();
    assert_eq!(script.root().category(), NodeCategory::Fsm);
}

#[test]
fn settings_file_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("scripts")).unwrap();
    fs::write(
        dir.path().join("skills.ron"),
        r#"(skills: [(id: 1, name: "Nap", script: "nap")])"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("scripts").join("nap.ron"),
        r#"(tag: "FiniteTimeBhv", attrs: [("Duration", "1")])"#,
    )
    .unwrap();

    let content = ContentLoader::new(dir.path())
        .load(&NodeRegistry::with_builtins())
        .unwrap();
    assert_eq!(content.settings, RuntimeSettings::default());
    assert!(content.scripts.contains("nap"));
}

#[test]
fn invalid_script_is_left_out() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("scripts")).unwrap();
    fs::write(
        dir.path().join("skills.ron"),
        r#"(skills: [(id: 1, name: "Nap", script: "nap")])"#,
    )
    .unwrap();
    // FiniteTimeBhv requires a duration.
    fs::write(
        dir.path().join("scripts").join("nap.ron"),
        r#"(tag: "FiniteTimeBhv")"#,
    )
    .unwrap();

    let content = ContentLoader::new(dir.path())
        .load(&NodeRegistry::with_builtins())
        .unwrap();
    assert_eq!(content.skills.len(), 1);
    assert!(content.scripts.is_empty());
}

#[test]
fn missing_catalog_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = ContentLoader::new(dir.path())
        .load(&NodeRegistry::with_builtins())
        .unwrap_err();
    assert!(err.to_string().contains("skills.ron"));
}
