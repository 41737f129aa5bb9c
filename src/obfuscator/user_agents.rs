//! User-agent selection (spec §2.B, §8 "the User-Agent sent on any two
//! requests within a session is identical"). Selection happens once, at
//! session start; the session pipeline stores and reuses the result rather
//! than calling this per request.

use rand::Rng;

/// Picks one candidate uniformly at random. Callers typically invoke this
/// once per session and cache the result on [`crate::model::session::SessionState`].
pub fn pick_user_agent(candidates: &[String], rng: &mut impl Rng) -> String {
    if candidates.is_empty() {
        return default_user_agent().to_string();
    }
    let idx = rng.gen_range(0..candidates.len());
    candidates[idx].clone()
}

fn default_user_agent() -> &'static str {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn empty_candidate_list_falls_back_to_default() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(pick_user_agent(&[], &mut rng), default_user_agent());
    }

    #[test]
    fn picks_one_of_the_candidates() {
        let candidates = vec!["ua-a".to_string(), "ua-b".to_string()];
        let mut rng = SmallRng::seed_from_u64(7);
        let picked = pick_user_agent(&candidates, &mut rng);
        assert!(candidates.contains(&picked));
    }
}
