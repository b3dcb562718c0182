//! Prompt templates for the script and panel-image requests.

use crate::panel::PanelScript;
use minijinja::{Environment, context};

const SYSTEM_INSTRUCTION_TEMPLATE: &str = r#"You are a manga script writer who explains topics through short, vivid stories.
Write exactly {{ panel_count }} panels. Use this format for every panel and nothing else:

Panel <number>:
Description: <what the reader sees: setting, characters, action, camera angle>
Dialogue: <speech or thought bubbles, prefixed with the speaking character>
SFX: <optional sound effect, omit the line if there is none>

Number the panels from 1 to {{ panel_count }}. Keep each description self-contained so it can be illustrated on its own.
The final panel must close the story with a moral or a short quiz question for the reader."#;

const SCRIPT_PROMPT_TEMPLATE: &str = r#"Create a manga script about the following topic: {{ topic }}"#;

const PANEL_IMAGE_TEMPLATE: &str = r#"Draw panel {{ position }} of {{ total }} of a black-and-white manga page.
{%- if previous %}
The previous panel showed: {{ previous }}
{%- endif %}

Scene: {{ panel.description }}
{%- if panel.dialogue %}
Dialogue: {{ panel.dialogue }}
{%- endif %}
{%- if panel.sfx %}
Sound effect: {{ panel.sfx }}
{%- endif %}

Render all dialogue inside speech bubbles and every sound effect as bold hand-drawn manga lettering, as part of the artwork itself.
Use clean screentone shading, expressive characters and dynamic composition. Do not add captions outside the panel."#;

fn render(template: &str, ctx: minijinja::Value) -> Result<String, minijinja::Error> {
    let env = Environment::new();
    let tmpl = env.template_from_str(template)?;
    tmpl.render(ctx)
}

/// System instruction constraining the text model to the panel script format.
pub fn system_instruction(panel_count: usize) -> Result<String, minijinja::Error> {
    render(
        SYSTEM_INSTRUCTION_TEMPLATE,
        context! { panel_count => panel_count },
    )
}

/// User prompt asking for a script about `topic`.
pub fn script_prompt(topic: &str) -> Result<String, minijinja::Error> {
    render(SCRIPT_PROMPT_TEMPLATE, context! { topic => topic.trim() })
}

/// Image prompt for the panel at `index`, with the preceding panel as continuity context.
pub fn panel_image_prompt(
    panel: &PanelScript,
    all_panels: &[PanelScript],
    index: usize,
) -> Result<String, minijinja::Error> {
    let previous = index
        .checked_sub(1)
        .and_then(|i| all_panels.get(i))
        .map(|p| p.description.as_str());

    render(
        PANEL_IMAGE_TEMPLATE,
        context! {
            panel => panel,
            position => index + 1,
            total => all_panels.len(),
            previous => previous,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(n: u32, sfx: Option<&str>) -> PanelScript {
        PanelScript {
            panel: n,
            description: format!("Scene number {n}"),
            dialogue: if n == 1 { String::new() } else { "KAI: Look!".to_string() },
            sfx: sfx.map(str::to_string),
        }
    }

    #[test]
    fn test_system_instruction_mentions_format() {
        let text = system_instruction(6).unwrap();
        assert!(text.contains("exactly 6 panels"));
        assert!(text.contains("Panel <number>:"));
        assert!(text.contains("Description:"));
        assert!(text.contains("Dialogue:"));
        assert!(text.contains("SFX:"));
        assert!(text.contains("moral or a short quiz"));
    }

    #[test]
    fn test_script_prompt_embeds_topic() {
        let text = script_prompt("  photosynthesis ").unwrap();
        assert!(text.ends_with("topic: photosynthesis"));
    }

    #[test]
    fn test_panel_prompt_includes_fields() {
        let panels = vec![panel(1, None), panel(2, Some("WHOOSH"))];
        let text = panel_image_prompt(&panels[1], &panels, 1).unwrap();

        assert!(text.contains("panel 2 of 2"));
        assert!(text.contains("The previous panel showed: Scene number 1"));
        assert!(text.contains("Scene: Scene number 2"));
        assert!(text.contains("Dialogue: KAI: Look!"));
        assert!(text.contains("Sound effect: WHOOSH"));
        assert!(text.contains("manga lettering"));
    }

    #[test]
    fn test_panel_prompt_omits_empty_sections() {
        let panels = vec![panel(1, None)];
        let text = panel_image_prompt(&panels[0], &panels, 0).unwrap();

        assert!(!text.contains("previous panel"));
        assert!(!text.contains("Dialogue:"));
        assert!(!text.contains("Sound effect:"));
    }
}
