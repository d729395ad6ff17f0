//! Theme classification and the instruction blocks fed to the poetry model.

/// Template family a theme falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeCategory {
    Love,
    Home,
    Season,
    Nature,
    TimeOfDay,
    Emotion,
    Place,
    Generic,
}

/// Themes with a dedicated template. Matching is exact and case-sensitive.
const CATEGORY_MEMBERS: &[(ThemeCategory, &[&str])] = &[
    (ThemeCategory::Love, &["love"]),
    (ThemeCategory::Home, &["home"]),
    (
        ThemeCategory::Season,
        &["spring", "summer", "autumn", "winter"],
    ),
    (ThemeCategory::Nature, &["ocean", "mountains", "forest"]),
    (ThemeCategory::TimeOfDay, &["sunrise", "sunset", "night"]),
    (ThemeCategory::Emotion, &["joy", "hope"]),
    (ThemeCategory::Place, &["garden", "city"]),
];

/// Topics shown to the user on `topics`, in display order.
pub const TOPIC_CATALOG: &[(&str, &[&str])] = &[
    ("Seasons", &["spring", "summer", "autumn", "winter"]),
    ("Nature", &["ocean", "mountains", "forest"]),
    ("Time of Day", &["sunrise", "sunset", "night"]),
    ("Emotions", &["love", "joy", "hope"]),
    ("Places", &["home", "garden", "city"]),
];

impl ThemeCategory {
    pub fn classify(theme: &str) -> Self {
        CATEGORY_MEMBERS
            .iter()
            .find(|(_, members)| members.contains(&theme))
            .map(|(category, _)| *category)
            .unwrap_or(ThemeCategory::Generic)
    }

    /// Full instruction block for `theme`, ending where the poem should begin.
    pub fn prompt(self, theme: &str) -> String {
        match self {
            ThemeCategory::Love => "Write a short, emotional poem about love. \
Focus on feelings of affection, connection, and deep emotion.
The poem should have a clear structure and use poetic language.
Avoid talking about songs or music.
Focus on the emotion itself:

"
            .to_string(),
            ThemeCategory::Home => "Write a short poem about home. \
Focus on feelings of comfort, family, and belonging.
The poem should describe what makes a home special.
Use specific details and emotional language:

"
            .to_string(),
            ThemeCategory::Season => format!(
                "Write a short poem about {theme}. \
Describe its unique weather, colors, and feelings.
The poem should capture the essence of this season.
Use vivid imagery and sensory details:

"
            ),
            ThemeCategory::Nature => format!(
                "Write a short poem about the {theme}. \
Describe its natural beauty and the emotions it evokes.
The poem should use rich imagery and sensory details.
Focus on the majesty of nature:

"
            ),
            ThemeCategory::TimeOfDay => format!(
                "Write a short poem about {theme}. \
Capture its magical atmosphere and the feelings it brings.
The poem should use vivid imagery and emotional language.
Focus on the beauty of this time:

"
            ),
            ThemeCategory::Emotion => format!(
                "Write a short poem about {theme}. \
Express deep emotions and personal feelings.
The poem should be uplifting and meaningful.
Use emotional language and imagery:

"
            ),
            ThemeCategory::Place => format!(
                "Write a short poem about a {theme}. \
Describe its unique atmosphere and what makes it special.
The poem should use vivid imagery and sensory details.
Focus on the beauty of this place:

"
            ),
            ThemeCategory::Generic => format!(
                "Write a short poem about {theme}. \
Focus on specific details and emotions.
The poem should have a clear structure and use poetic language.
Use vivid imagery and emotional language:

"
            ),
        }
    }
}

pub fn build_prompt(theme: &str) -> String {
    ThemeCategory::classify(theme).prompt(theme)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERPOLATED: &[&str] = &[
        "spring", "summer", "autumn", "winter", "ocean", "mountains", "forest", "sunrise",
        "sunset", "night", "joy", "hope", "garden", "city",
    ];

    #[test]
    fn interpolated_themes_appear_in_their_prompt() {
        for theme in INTERPOLATED {
            let category = ThemeCategory::classify(theme);
            assert_ne!(category, ThemeCategory::Generic, "{theme} fell through");
            assert!(build_prompt(theme).contains(theme), "{theme} missing");
        }
    }

    #[test]
    fn love_and_home_use_dedicated_text() {
        assert_eq!(ThemeCategory::classify("love"), ThemeCategory::Love);
        assert_eq!(ThemeCategory::classify("home"), ThemeCategory::Home);

        let love = build_prompt("love");
        assert!(love.contains("songs") || love.contains("music"));
        assert_eq!(love, ThemeCategory::Love.prompt("something else"));
        assert_eq!(build_prompt("home"), ThemeCategory::Home.prompt("elsewhere"));
    }

    #[test]
    fn unknown_theme_falls_back_to_generic() {
        assert_eq!(ThemeCategory::classify("robot"), ThemeCategory::Generic);
        assert!(build_prompt("robot").contains("about robot."));
    }

    #[test]
    fn classification_is_case_sensitive() {
        assert_eq!(ThemeCategory::classify("Love"), ThemeCategory::Generic);
        assert_eq!(ThemeCategory::classify("OCEAN"), ThemeCategory::Generic);
        assert!(build_prompt("OCEAN").contains("OCEAN"));
    }

    #[test]
    fn every_prompt_ends_at_an_open_continuation_point() {
        for theme in ["love", "home", "winter", "forest", "night", "hope", "city", "robot"] {
            assert!(build_prompt(theme).ends_with(":\n\n"), "{theme}");
            assert!(!build_prompt(theme).contains('{'));
        }
    }

    #[test]
    fn instruction_opens_with_two_sentences_on_one_line() {
        let first_line = |theme: &str| build_prompt(theme).lines().next().unwrap().to_string();
        assert_eq!(
            first_line("winter"),
            "Write a short poem about winter. Describe its unique weather, colors, and feelings."
        );
        assert_eq!(
            first_line("garden"),
            "Write a short poem about a garden. \
Describe its unique atmosphere and what makes it special."
        );
        assert_eq!(
            first_line("love"),
            "Write a short, emotional poem about love. \
Focus on feelings of affection, connection, and deep emotion."
        );
        for theme in ["forest", "sunset", "joy", "robot", "home"] {
            assert_eq!(build_prompt(theme).lines().count(), 4, "{theme}");
            assert!(first_line(theme).contains(". "), "{theme}");
        }
    }

    #[test]
    fn catalog_lists_every_dedicated_theme() {
        let listed: Vec<&str> = TOPIC_CATALOG
            .iter()
            .flat_map(|(_, members)| members.iter().copied())
            .collect();
        for (_, members) in CATEGORY_MEMBERS {
            for member in *members {
                assert!(listed.contains(member));
            }
        }
    }
}
