//! Replay slug parsing.
//!
//! Replay URLs historically carried `{projectSlug}:{replayId}`. Replays can
//! span projects, so the project part is ignored and resolved from the record
//! instead, but the legacy form is still accepted.

/// Extract the replay id from a replay slug.
///
/// Exactly one `:` separator yields the part after it; anything else is
/// treated as a bare replay id.
pub fn parse_replay_id(replay_slug: &str) -> &str {
    let mut parts = replay_slug.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_project), Some(replay_id), None) => replay_id,
        (Some(first), _, _) => first,
        _ => replay_slug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLAY_ID: &str = "761104e184c64d439ee1014b72b4d83b";

    #[test]
    fn test_project_and_replay_id() {
        assert_eq!(parse_replay_id(&format!("javascript:{REPLAY_ID}")), REPLAY_ID);
        assert_eq!(parse_replay_id("p:r"), "r");
    }

    #[test]
    fn test_bare_replay_id() {
        assert_eq!(parse_replay_id(REPLAY_ID), REPLAY_ID);
        assert_eq!(parse_replay_id(""), "");
    }

    #[test]
    fn test_malformed_slug_keeps_first_part() {
        assert_eq!(parse_replay_id("a:b:c"), "a");
        assert_eq!(parse_replay_id(":r"), "r");
    }
}
