//! Dice roller: `!dice XdY`.

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use regex::Regex;

use crate::gateway::{Command, CommandContext, Reply};

const MAX_DICE: u32 = 20;

pub struct DiceCommand;

#[async_trait]
impl Command for DiceCommand {
    fn name(&self) -> &'static str {
        "!dice"
    }

    fn usage(&self) -> &'static str {
        "!dice XdY (e.g.: !dice 3d6)"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        let args = ctx.args();
        let spec = match args.get(1) {
            Some(s) => *s,
            None => return Ok(Reply::Text(format!("🎲 Usage: {}", self.usage()))),
        };

        let (count, faces) = match parse_spec(spec) {
            Some(parsed) => parsed,
            None => {
                return Ok(Reply::Text(format!(
                    "⚠️ Invalid format. E.g.: {}",
                    self.usage()
                )))
            }
        };
        if count < 1 || faces < 1 || count > MAX_DICE {
            return Ok(Reply::Text(format!(
                "⚠️ Between 1 and {} dice, faces ≥ 1.",
                MAX_DICE
            )));
        }

        let mut rng = rand::thread_rng();
        let rolls: Vec<u32> = (0..count).map(|_| rng.gen_range(1..=faces)).collect();
        let total: u64 = rolls.iter().map(|&r| u64::from(r)).sum();
        let listing = rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Reply::Text(format!(
            "🎲 Result: *{}d{}*\n{} → Total: *{}*",
            count, faces, listing, total
        )))
    }
}

/// Parse an `XdY` spec, case-insensitively. None for anything malformed.
fn parse_spec(spec: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"^(\d+)d(\d+)$").ok()?;
    let spec = spec.to_lowercase();
    let caps = re.captures(&spec)?;
    let count = caps.get(1)?.as_str().parse().ok()?;
    let faces = caps.get(2)?.as_str().parse().ok()?;
    Some((count, faces))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_specs() {
        assert_eq!(parse_spec("3d6"), Some((3, 6)));
        assert_eq!(parse_spec("1d20"), Some((1, 20)));
        assert_eq!(parse_spec("2D8"), Some((2, 8)));
    }

    #[test]
    fn rejects_malformed_specs() {
        assert_eq!(parse_spec("d6"), None);
        assert_eq!(parse_spec("3d"), None);
        assert_eq!(parse_spec("3x6"), None);
        assert_eq!(parse_spec("-3d6"), None);
        assert_eq!(parse_spec(""), None);
    }
}
