//! Default renderer: embedded-logic templates executed with the `rhai`
//! scripting engine.
//!
//! A template is compiled into one script that appends to an output
//! string. Script functions defined by any successful render are kept in
//! the function library and stay callable in every later render.

use std::fmt::Write as _;

use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{Dynamic, Engine, ImmutableString, Map, Scope, AST};
use serde::Serialize;
use serde_json::Value;

use super::ejs::{self, Segment};
use super::{escape_html, RenderContext, RenderError, TemplateRenderer};

const OUTPUT_VAR: &str = "template_output";

/// The `f` binding: a free-form table plus the script functions collected
/// so far.
#[derive(Debug, Clone)]
pub struct RhaiFuncs {
    library: AST,
    table: Map,
}

impl Default for RhaiFuncs {
    fn default() -> Self {
        Self {
            library: AST::empty(),
            table: Map::new(),
        }
    }
}

impl RhaiFuncs {
    pub fn table(&self) -> &Map {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Map {
        &mut self.table
    }

    /// Whether a script function with this name has been defined.
    pub fn defines(&self, name: &str) -> bool {
        self.library.iter_functions().any(|f| f.name == name)
    }
}

/// Renders templates with a shared [`Engine`].
pub struct RhaiRenderer {
    engine: Engine,
}

impl Default for RhaiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RhaiRenderer {
    pub fn new() -> Self {
        let mut engine = Engine::new();

        engine.register_fn("escape_html", |value: Dynamic| escape_html(&display(&value)));
        engine.register_fn("to_markup", |value: Dynamic| display(&value));

        engine.on_print(|text| tracing::info!(target: "story_script", "{}", text));
        engine.on_debug(|text, _source, pos| {
            tracing::debug!(target: "story_script", position = ?pos, "{}", text)
        });

        Self { engine }
    }

    /// Bound the number of operations a single render may perform.
    pub fn with_max_operations(mut self, operations: u64) -> Self {
        self.engine.set_max_operations(operations);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Access to the engine, e.g. to register host functions.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

impl TemplateRenderer for RhaiRenderer {
    type Funcs = RhaiFuncs;

    fn render(&self, template: &str, ctx: RenderContext<'_, RhaiFuncs>) -> Result<String, RenderError> {
        let RenderContext {
            story,
            snippet,
            state,
            funcs,
        } = ctx;

        let segments = ejs::parse(template)?;
        let script = build_script(&segments);
        let ast = self
            .engine
            .compile(&script)
            .map_err(|err| RenderError::Compile(err.to_string()))?;

        let mut scope = Scope::new();
        scope.push(OUTPUT_VAR, ImmutableString::new());
        scope.push_constant_dynamic("story", to_binding(&story)?);
        scope.push_constant_dynamic("snippet", to_binding(snippet)?);
        scope.push_dynamic("s", to_binding(&*state)?);
        scope.push_dynamic("f", Dynamic::from_map(funcs.table.clone()));

        let program = funcs.library.merge(&ast);
        self.engine
            .run_ast_with_scope(&mut scope, &program)
            .map_err(|err| RenderError::Runtime(err.to_string()))?;

        let output = scope
            .get_value::<ImmutableString>(OUTPUT_VAR)
            .ok_or_else(|| RenderError::Binding(format!("\"{}\" is no longer a string", OUTPUT_VAR)))?;
        let new_state = scope
            .get_value::<Dynamic>("s")
            .ok_or_else(|| RenderError::Binding("\"s\" is gone".to_string()))?;
        let new_state: Value =
            from_dynamic(&new_state).map_err(|err| RenderError::Binding(format!("\"s\": {}", err)))?;
        let table = scope
            .get_value::<Map>("f")
            .ok_or_else(|| RenderError::Binding("\"f\" is no longer a map".to_string()))?;

        *state = new_state;
        funcs.table = table;
        funcs.library = funcs.library.merge(&ast.clone_functions_only());

        Ok(output.to_string())
    }

    fn setup_block(&self, code: &str) -> String {
        format!("<%\n{}\n-%>\n", code)
    }
}

fn to_binding<T: Serialize + ?Sized>(value: &T) -> Result<Dynamic, RenderError> {
    to_dynamic(value).map_err(|err| RenderError::Binding(err.to_string()))
}

/// Output form of a value; unit prints nothing.
fn display(value: &Dynamic) -> String {
    if value.is_unit() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Turn template segments into a script appending to [`OUTPUT_VAR`].
fn build_script(segments: &[Segment<'_>]) -> String {
    let mut script = String::new();

    for (index, segment) in segments.iter().enumerate() {
        match *segment {
            Segment::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                script.push_str(OUTPUT_VAR);
                script.push_str(" += ");
                push_string_literal(&mut script, text);
                script.push_str(";\n");
            }
            Segment::Code(code) => {
                let trimmed = code.trim();
                if trimmed.is_empty() {
                    continue;
                }
                // The terminator goes on its own line so a trailing line
                // comment cannot swallow it.
                script.push_str(trimmed);
                script.push('\n');
                if !opens_block(trimmed) && !continued(trimmed, segments.get(index + 1)) {
                    script.push_str(";\n");
                }
            }
            Segment::Escaped(expr) => {
                let _ = writeln!(script, "{} += escape_html({});", OUTPUT_VAR, expr.trim());
            }
            Segment::Raw(expr) => {
                let _ = writeln!(script, "{} += to_markup({});", OUTPUT_VAR, expr.trim());
            }
        }
    }

    script
}

fn opens_block(code: &str) -> bool {
    code.ends_with('{')
}

/// A bare `}` whose block goes on in the next tag (`<% } %><% else { %>`).
fn continued(code: &str, next: Option<&Segment<'_>>) -> bool {
    if code != "}" {
        return false;
    }
    match next {
        Some(Segment::Code(next)) => {
            let next = next.trim_start();
            next.starts_with("else") || next.starts_with("catch")
        }
        _ => false,
    }
}

fn push_string_literal(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Snippet, SnippetId};
    use crate::template::StoryView;
    use serde_json::json;
    use story_compiler::Author;

    fn render(
        renderer: &RhaiRenderer,
        template: &str,
        state: &mut Value,
        funcs: &mut RhaiFuncs,
    ) -> Result<String, RenderError> {
        let author = Author::new("Ada");
        let history = [SnippetId(0), SnippetId(1)];
        let snippet = Snippet {
            id: SnippetId(1),
            name: "hall".into(),
            start: false,
            tags: vec!["inside".into()],
            source: template.to_string(),
        };
        let ctx = RenderContext {
            story: StoryView {
                title: "Lighthouse",
                author: &author,
                version: "1.0.0",
                history: &history,
            },
            snippet: &snippet,
            state,
            funcs,
        };
        renderer.render(template, ctx)
    }

    fn render_once(template: &str, state: &mut Value) -> Result<String, RenderError> {
        render(&RhaiRenderer::new(), template, state, &mut RhaiFuncs::default())
    }

    #[test]
    fn test_plain_text_survives() {
        let text = "<p class=\"x\">Line one\n\tback\\slash</p>";
        assert_eq!(render_once(text, &mut json!({})).unwrap(), text);
    }

    #[test]
    fn test_escaped_and_raw_output() {
        let mut state = json!({ "name": "<Bo>" });
        assert_eq!(
            render_once("<p>Hi <%= s.name %>!</p>", &mut state).unwrap(),
            "<p>Hi &lt;Bo&gt;!</p>"
        );
        assert_eq!(render_once("<%- s.name %>", &mut state).unwrap(), "<Bo>");
        assert_eq!(render_once("[<%= s.missing %>]", &mut state).unwrap(), "[]");
    }

    #[test]
    fn test_bindings() {
        let out = render_once(
            "<%= story.title %>/<%= story.author.name %>/<%= snippet.name %>/<%= story.history.len() %>",
            &mut json!({}),
        )
        .unwrap();
        assert_eq!(out, "Lighthouse/Ada/hall/2");
    }

    #[test]
    fn test_code_mutates_state() {
        let mut state = json!({ "visits": 1 });
        render_once("<% s.visits += 1; s.seen = true %>", &mut state).unwrap();
        assert_eq!(state, json!({ "visits": 2, "seen": true }));
    }

    #[test]
    fn test_control_flow_across_tags() {
        let template = "<% if s.lit { %>light<% } else { %>dark<% } %>";
        assert_eq!(render_once(template, &mut json!({ "lit": true })).unwrap(), "light");
        assert_eq!(render_once(template, &mut json!({ "lit": false })).unwrap(), "dark");
    }

    #[test]
    fn test_failed_render_keeps_state() {
        let mut state = json!({ "x": 0 });
        let err = render_once("<% s.x = 1; throw \"boom\"; %>", &mut state).unwrap_err();
        assert!(matches!(err, RenderError::Runtime(_)));
        assert_eq!(state, json!({ "x": 0 }));
    }

    #[test]
    fn test_compile_error() {
        let err = render_once("<% let = %>", &mut json!({})).unwrap_err();
        assert!(matches!(err, RenderError::Compile(_)));
    }

    #[test]
    fn test_functions_persist_between_renders() {
        let renderer = RhaiRenderer::new();
        let mut funcs = RhaiFuncs::default();
        let mut state = json!({});

        render(&renderer, "<% fn double(x) { x * 2 } %>", &mut state, &mut funcs).unwrap();
        assert!(funcs.defines("double"));
        let out = render(&renderer, "<%= double(21) %>", &mut state, &mut funcs).unwrap();
        assert_eq!(out, "42");
    }

    #[test]
    fn test_table_persists_between_renders() {
        let renderer = RhaiRenderer::new();
        let mut funcs = RhaiFuncs::default();
        let mut state = json!({});

        render(&renderer, "<% f.greeting = \"hello\" %>", &mut state, &mut funcs).unwrap();
        assert!(funcs.table().contains_key("greeting"));
        let out = render(&renderer, "<%= f.greeting %>", &mut state, &mut funcs).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_operation_budget() {
        let renderer = RhaiRenderer::new().with_max_operations(1_000);
        let err = render(
            &renderer,
            "<% loop { } %>",
            &mut json!({}),
            &mut RhaiFuncs::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Runtime(_)));
    }

    #[test]
    fn test_build_script() {
        let segments = ejs::parse("a<% let x = 1 %><%= x %>").unwrap();
        assert_eq!(
            build_script(&segments),
            "template_output += \"a\";\nlet x = 1\n;\ntemplate_output += escape_html(x);\n"
        );

        let segments = ejs::parse("<% if s.a { %>x<% } %><% else { %>y<% } %>").unwrap();
        assert_eq!(
            build_script(&segments),
            "if s.a {\ntemplate_output += \"x\";\n}\nelse {\ntemplate_output += \"y\";\n}\n;\n"
        );
    }

    #[test]
    fn test_code_ending_in_map_literal() {
        let mut state = json!({});
        let out = render_once("<% s.pos = #{x: 1} %>after", &mut state).unwrap();
        assert_eq!(out, "after");
        assert_eq!(state, json!({ "pos": { "x": 1 } }));
    }

    #[test]
    fn test_code_ending_in_line_comment() {
        let mut state = json!({});
        let out = render_once("<% s.x = 1 // set x %>after", &mut state).unwrap();
        assert_eq!(out, "after");
        assert_eq!(state, json!({ "x": 1 }));
    }

    #[test]
    fn test_wrapped_script_file_ending_in_comment() {
        let template = "<%\n/* tag rule \"night\": code/stars.rhai */\ns.stars = true // done\n%>\n\n<p>body</p>";
        let mut state = json!({});
        let out = render_once(template, &mut state).unwrap();
        assert_eq!(out, "\n\n<p>body</p>");
        assert_eq!(state, json!({ "stars": true }));
    }

    #[test]
    fn test_else_in_separate_tag() {
        let template = "<% if s.lit { %>light<% } %><% else { %>dark<% } %>";
        assert_eq!(render_once(template, &mut json!({ "lit": true })).unwrap(), "light");
        assert_eq!(render_once(template, &mut json!({ "lit": false })).unwrap(), "dark");
    }
}
