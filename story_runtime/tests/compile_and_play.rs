//! End-to-end: compile a small project from disk and play it.
//!
//! These tests cover the whole path:
//! - Project config parsing and checks
//! - Tag-rule and snippet content injection
//! - Loading the compiled document back
//! - Navigation, checkpoints and save/load across sessions

use std::fs;
use std::path::Path;

use serde_json::json;
use story_compiler::{
    BuildError, CompileOptions, CompiledStory, FsContentLoader, ProjectConfig, SnippetSource,
    StoryCompiler,
};
use story_runtime::{
    LoadOptions, PlayerState, RestoreOptions, RhaiRenderer, SaveObj, SnippetId, Story, StoryPlayer,
};

const PROJECT: &str = r#"
[story]
title = "The Lighthouse"
author = { name = "Ada" }
version = "0.2.0"

[scripts]
story = "code/setup.rhai"
global = "code/global.rhai"

[[scripts.tags]]
rule = "night && !inside"
files = "code/stars.rhai"

[[styles.tags]]
rule = "night"
files = ["style/night.css", "style/missing.css"]
"#;

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn project_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "code/setup.rhai",
        "if s.visits == () { s.visits = 0; }\nif s.lamp == () { s.lamp = \"off\"; }",
    );
    write(root, "code/global.rhai", "s.visits += 1;");
    write(root, "code/stars.rhai", "s.saw_stars = true // seen from the shore");
    write(root, "code/tower.rhai", "s.lamp = \"on\";");
    write(root, "style/night.css", "body { background: black; }");
    dir
}

fn snippets() -> Vec<SnippetSource> {
    vec![
        SnippetSource::new(
            "shore",
            r#"<p>Visit <%= s.visits %>.</p><iff-link to="tower"/><a data-snippet="tower">Climb</a>"#,
        )
        .starting()
        .with_tags("night"),
        SnippetSource::new(
            "tower",
            r#"<p>The lamp is <%= s.lamp %>.</p><a data-snippet="shore">Down</a>"#,
        )
        .with_tags("night inside")
        .with_script("code/tower.rhai"),
    ]
}

fn compile(dir: &tempfile::TempDir) -> Result<CompiledStory, BuildError> {
    let config = ProjectConfig::from_toml_str(PROJECT).unwrap();
    let loader = FsContentLoader::new(dir.path());
    StoryCompiler::new(&config, &loader).compile(snippets())
}

fn play(artifact: &str) -> StoryPlayer<RhaiRenderer> {
    let story = Story::from_json(artifact, RhaiRenderer::new().with_max_operations(100_000)).unwrap();
    StoryPlayer::new(story)
}

#[test]
fn test_compile_project() {
    let dir = project_dir();
    let compiled = compile(&dir).unwrap();

    assert_eq!(compiled.title, "The Lighthouse");
    assert_eq!(compiled.version, "0.2.0");
    assert_eq!(compiled.suggested_file_name(None), "The_Lighthouse.html");

    let shore = &compiled.snippets[0].source;
    assert!(shore.contains("s.saw_stars = true // seen from the shore\n%>"));
    assert!(shore.contains("background: black"));
    assert!(shore.find("s.visits += 1;").unwrap() < shore.find("<style>").unwrap());

    assert!(!shore.contains("iff-link"));

    let tower = &compiled.snippets[1].source;
    assert!(!tower.contains("saw_stars"));
    assert!(tower.find("</style>").unwrap() < tower.find("s.lamp = \"on\";").unwrap());
    assert!(tower.ends_with(r#"<a data-snippet="shore">Down</a>"#));
}

#[test]
fn test_play_session() {
    let dir = project_dir();
    let artifact = compile(&dir).unwrap().to_json_string().unwrap();
    let mut player = play(&artifact);

    player.start().unwrap();
    let view = player.current_view().unwrap();
    assert!(view.markup.contains("<p>Visit 1.</p>"));
    assert!(view.markup.contains("<style>"));
    // the tag-rule script ends in a line comment
    assert_eq!(player.state()["saw_stars"], true);

    let climb = view.links[0].clone();
    player.follow_link(&climb).unwrap();
    assert!(player
        .current_view()
        .unwrap()
        .markup
        .contains("<p>The lamp is on.</p>"));
    assert_eq!(player.state()["visits"], 2);

    let tower = player.story().get_snippet("tower").unwrap();
    assert_eq!(tower.matches_rule("night && inside"), Ok(true));

    player.create_checkpoint();
    let down = player.current_view().unwrap().links[0].clone();
    player.follow_link(&down).unwrap();
    assert_eq!(player.state()["visits"], 3);

    // variables come back, navigation stays on the shore
    assert!(player.restore_checkpoint(RestoreOptions::default()));
    assert_eq!(player.state()["visits"], 3);
    assert_eq!(player.status(), PlayerState::Showing(SnippetId(0)));
    assert_eq!(
        player.history(),
        &[SnippetId(0), SnippetId(1), SnippetId(0), SnippetId(0)]
    );

    // a new session picks up from the save
    let saved = player.save().to_json_string().unwrap();
    let mut resumed = play(&artifact);
    resumed
        .load(SaveObj::from_json_str(&saved).unwrap(), LoadOptions::default())
        .unwrap();

    assert_eq!(resumed.state()["visits"], 4);
    assert_eq!(resumed.state()["lamp"], "on");
    assert_eq!(resumed.history().len(), 5);
    assert!(resumed.checkpoint().is_some());
    assert!(resumed
        .current_view()
        .unwrap()
        .markup
        .contains("<p>Visit 4.</p>"));
}

#[test]
fn test_broken_project_produces_nothing() {
    let dir = project_dir();
    let mut sources = snippets();
    sources[1].tags = "night 2nd_floor".to_string();

    let config = ProjectConfig::from_toml_str(PROJECT).unwrap();
    let loader = FsContentLoader::new(dir.path());
    let result = StoryCompiler::new(&config, &loader)
        .with_options(CompileOptions {
            test_from: Some("tower".into()),
        })
        .compile(sources);

    match result {
        Err(BuildError::SnippetTags { snippet, .. }) => assert_eq!(snippet, "tower"),
        other => panic!("expected a tag error, got {:?}", other.map(|s| s.title)),
    }
}

#[test]
fn test_fresh_state_is_empty() {
    let dir = project_dir();
    let artifact = compile(&dir).unwrap().to_json_string().unwrap();
    let player = play(&artifact);
    assert_eq!(player.state(), &json!({}));
    assert_eq!(player.status(), PlayerState::Unstarted);
}
