use std::sync::OnceLock;

use regex::Regex;

pub const STATS_BASE_URL: &str = "http://stats.ncaa.org";

fn org_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[?&]org_id=(\d+)").expect("valid org_id regex"))
}

fn team_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/teams?/(\d+)").expect("valid team path regex"))
}

fn game_stats_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/game/(?:box_score|play_by_play|situational_stats)/(\d+)")
            .expect("valid game stats regex")
    })
}

fn game_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/game/index/(\d+)").expect("valid game index regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPage {
    BoxScore,
    PlayByPlay,
}

impl StatsPage {
    fn path(self) -> &'static str {
        match self {
            StatsPage::BoxScore => "box_score",
            StatsPage::PlayByPlay => "play_by_play",
        }
    }
}

/// Team id from `org_id=<n>`, falling back to a `/team/<n>` path segment.
pub fn url_to_team_id(url: &str) -> Option<u64> {
    capture_u64(org_id_re(), url).or_else(|| capture_u64(team_path_re(), url))
}

/// Game id of a box-score or play-by-play link.
pub fn stats_link_to_game_id(url: &str) -> Option<u64> {
    capture_u64(game_stats_re(), url)
}

/// Game id of the schedule page's outcome link.
pub fn game_link_to_game_id(url: &str) -> Option<u64> {
    capture_u64(game_index_re(), url).or_else(|| stats_link_to_game_id(url))
}

pub fn stats_link(game_id: u64, page: StatsPage) -> String {
    format!("{STATS_BASE_URL}/game/{}/{game_id}", page.path())
}

fn capture_u64(re: &Regex, url: &str) -> Option<u64> {
    re.captures(url)?.get(1)?.as_str().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_ids_from_query_or_path() {
        assert_eq!(
            url_to_team_id("/team/index/11540?org_id=328"),
            Some(328)
        );
        assert_eq!(url_to_team_id("http://stats.ncaa.org/team/697/12260"), Some(697));
        assert_eq!(url_to_team_id("/people/123"), None);
    }

    #[test]
    fn game_ids_from_links() {
        assert_eq!(
            stats_link_to_game_id("http://stats.ncaa.org/game/box_score/3521234"),
            Some(3_521_234)
        );
        assert_eq!(
            stats_link_to_game_id("/game/play_by_play/3521234?period_no=1"),
            Some(3_521_234)
        );
        assert_eq!(game_link_to_game_id("/game/index/3521234?org_id=2"), Some(3_521_234));
        assert_eq!(game_link_to_game_id("/team/2/12260"), None);
    }

    #[test]
    fn stats_link_round_trips() {
        let url = stats_link(42, StatsPage::PlayByPlay);
        assert_eq!(url, "http://stats.ncaa.org/game/play_by_play/42");
        assert_eq!(stats_link_to_game_id(&url), Some(42));
    }
}
