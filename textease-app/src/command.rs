//! Console input decoding. Every line becomes exactly one [`Command`]; the
//! session core only ever sees the decoded [`Action`].
use std::path::PathBuf;
use textease_actors::{Action, ClaimRef};
use textease_pipeline::Strength;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Act(Action),
    File(PathBuf), // /file <path>
    Help,          // /help
    Quit,          // /quit or /exit
    Usage(&'static str),
    Unknown(String),
    Blank,
}

pub const HELP: &str = "\
Send any text to work with it, or use a command:
  /simplify <light|medium|strong>  simplify the current text
  /translate                       translate the simplified text (or the open claim)
  /claims                          split the text into claims
  /claim <n> [level]               simplify claim n, optionally at another level
  /original                        show the original text
  /simplified                      show the simplified text again
  /list                            show the claim list again
  /back                            return to your text and pick a level
  /file <path>                     load a .txt or .docx document
  /help                            this message
  /quit                            leave";

pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Command::Blank;
    }
    if !trimmed.starts_with('/') {
        return Command::Act(Action::SubmitText {
            text: input.trim_end_matches(['\r', '\n']).to_string(),
        });
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match verb {
        "/simplify" => match rest.map(str::parse::<Strength>) {
            Some(Ok(strength)) => Command::Act(Action::ChooseStrength { strength }),
            _ => Command::Usage("/simplify <light|medium|strong>"),
        },
        "/translate" => Command::Act(Action::Translate),
        "/claims" => Command::Act(Action::ExtractClaims),
        "/claim" => parse_claim(rest),
        "/original" => Command::Act(Action::ShowOriginal),
        "/simplified" => Command::Act(Action::ShowSimplified),
        "/list" => Command::Act(Action::ShowClaims),
        "/back" => Command::Act(Action::Back),
        "/file" => match rest {
            Some(path) => Command::File(PathBuf::from(path)),
            None => Command::Usage("/file <path>"),
        },
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

fn parse_claim(rest: Option<&str>) -> Command {
    const USAGE: &str = "/claim <n> [light|medium|strong]";
    let Some(rest) = rest else {
        return Command::Usage(USAGE);
    };
    let mut args = rest.split_whitespace();
    let number = args.next().and_then(|n| n.parse::<usize>().ok()).filter(|n| *n > 0);
    let Some(number) = number else {
        return Command::Usage(USAGE);
    };
    let claim = ClaimRef::at(number - 1);

    match (args.next(), args.next()) {
        (None, _) => Command::Act(Action::SimplifyClaim { claim }),
        (Some(level), None) => match level.parse::<Strength>() {
            Ok(strength) => Command::Act(Action::ChangeClaimStrength { claim, strength }),
            Err(_) => Command::Usage(USAGE),
        },
        _ => Command::Usage(USAGE),
    }
}

/// The console spelling of a suggested next action.
pub fn suggestion(action: &Action) -> String {
    match action {
        Action::SubmitText { .. } | Action::SubmitDocument { .. } => "<text>".to_string(),
        Action::ChooseStrength { strength } => format!("/simplify {strength}"),
        Action::Translate => "/translate".to_string(),
        Action::ExtractClaims => "/claims".to_string(),
        Action::SimplifyClaim { claim } => format!("/claim {}", claim.index + 1),
        Action::ChangeClaimStrength { claim, strength } => {
            format!("/claim {} {strength}", claim.index + 1)
        }
        Action::ShowOriginal => "/original".to_string(),
        Action::ShowSimplified => "/simplified".to_string(),
        Action::ShowClaims => "/list".to_string(),
        Action::Back => "/back".to_string(),
    }
}
