//! The two human-editable template files.
//!
//! The clip analysis template is a fixed text. The generation prompt
//! template is fixed apart from one `Source clip:` line naming the input
//! video. Neither embeds timestamps or anything else that varies between
//! runs, so repeated runs with the same input produce identical bytes.

use std::{fs, path::Path};

use crate::error::{PrepareError, Stage};

/// Header line of the clip analysis template.
pub const CLIP_ANALYSIS_HEADER: &str = "Clip Analysis (fill these 2-3 sentences):";

/// Full text of the clip analysis template.
pub const CLIP_ANALYSIS_TEMPLATE: &str = "\
Clip Analysis (fill these 2-3 sentences):
Tone (one word):
Key visuals (who/what/where):
Exact last frame description (one sentence) - IMPORTANT continuity anchor:
Audio (music/VO/SFX):

Write your 2-3 sentence analysis below:
";

const AI_PROMPT_HEAD: &str = "\
AI Video Generation Prompt (8-12 seconds continuation)
";

const AI_PROMPT_BODY: &str = "\
Start/continuity: The original clip ends on: <PASTE the one-sentence exact last-frame description here>

High-level: Create an 8-12 second photorealistic continuation of the provided clip. Match tone and lighting of the original clip. Aspect ratio 16:9, resolution 1920x1080, 24fps.

Scene 1 (0:00–0:03): [describe shot, camera move, lighting, action].
Scene 2 (0:03–0:07): [describe shot, VO exact text, on-screen text & durations].
Scene 3 (0:07–0:0[8–12]): [packshot/logo/CTA], show QR? [yes/no]. End card hold 1.5–2s.

Style notes: Match color grade (e.g., warm highlights, muted shadows), shallow depth-of-field, natural film grain. Deliver MP4 1920x1080 24fps, 8–12s.

EXAMPLE:
Start/continuity: original ends on a close-up of a steaming mug with warm left rim light.
Scene 1: slow push-in to the mug; steam visible; soft acoustic guitar enters.
Scene 2: medium shot of same person smiling and taking a sip; VO: \"Start brighter.\" On-screen text: \"Feel the difference\" (1.8s).
Scene 3: dolly out to packshot; logo + CTA \"Scan to try — 50% off\", QR bottom-right. End card hold 1.5s.
";

/// Render the generation prompt template for `input`.
///
/// The input path is embedded verbatim on the `Source clip:` line.
pub fn ai_prompt(input: &Path) -> String {
    format!(
        "{AI_PROMPT_HEAD}\nSource clip: {}\n\n{AI_PROMPT_BODY}",
        input.display()
    )
}

/// Write the clip analysis template to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`PrepareError::TemplateWrite`] with [`Stage::WriteAnalysis`].
pub fn write_clip_analysis(path: &Path) -> Result<(), PrepareError> {
    write_template(path, CLIP_ANALYSIS_TEMPLATE, Stage::WriteAnalysis)
}

/// Write the generation prompt template for `input` to `path`, replacing
/// any existing file.
///
/// # Errors
///
/// Returns [`PrepareError::TemplateWrite`] with [`Stage::WritePrompt`].
pub fn write_ai_prompt(path: &Path, input: &Path) -> Result<(), PrepareError> {
    write_template(path, &ai_prompt(input), Stage::WritePrompt)
}

fn write_template(path: &Path, contents: &str, stage: Stage) -> Result<(), PrepareError> {
    fs::write(path, contents).map_err(|source| PrepareError::TemplateWrite {
        path: path.to_path_buf(),
        stage,
        source,
    })?;
    log::info!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_starts_with_header() {
        assert!(CLIP_ANALYSIS_TEMPLATE.starts_with(CLIP_ANALYSIS_HEADER));
        for prompt in [
            "Tone (one word):",
            "Key visuals (who/what/where):",
            "Exact last frame description",
            "Audio (music/VO/SFX):",
        ] {
            assert!(CLIP_ANALYSIS_TEMPLATE.contains(prompt), "missing {prompt}");
        }
    }

    #[test]
    fn prompt_embeds_input_path_verbatim() {
        let text = ai_prompt(Path::new("renders/take 3/input_clip.mp4"));
        assert!(text.contains("\nSource clip: renders/take 3/input_clip.mp4\n"));
        assert!(text.contains("8-12 second photorealistic continuation"));
        assert!(text.contains("EXAMPLE:"));
    }

    #[test]
    fn prompt_is_stable_for_same_input() {
        let input = Path::new("input_clip.mp4");
        assert_eq!(ai_prompt(input), ai_prompt(input));
    }

    #[test]
    fn write_into_missing_directory_names_stage() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("missing").join("clip_analysis.txt");
        let error = write_clip_analysis(&path).unwrap_err();
        assert_eq!(error.stage(), Stage::WriteAnalysis);
    }
}
