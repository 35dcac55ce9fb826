//! Interactive prompts.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

use crate::error::{PackwiseError, Result};

use super::{parse_yes, Prompt, PromptResult, PromptType};

fn map_dialoguer_err(e: dialoguer::Error) -> PackwiseError {
    PackwiseError::Io(e.into())
}

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

/// Prompt the user for input on `term`.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let theme = prompt_theme();
    match prompt.prompt_type {
        PromptType::Confirm => {
            let default = prompt.default.as_deref().map(parse_yes).unwrap_or(false);
            let answer = Confirm::with_theme(&theme)
                .with_prompt(&prompt.question)
                .default(default)
                .interact_on(term)
                .map_err(map_dialoguer_err)?;
            Ok(PromptResult::Bool(answer))
        }
    }
}
