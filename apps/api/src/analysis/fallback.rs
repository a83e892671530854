//! Fallback analysis: deterministic position/age heuristic.
//!
//! Served whenever the completion path fails (provider error, timeout,
//! unparseable or incomplete output) and in fallback mode. Pure function of the
//! profile: identical inputs always produce identical analyses.
//!
//! Algorithm:
//! 1. Base score vector by position (unknown → Milieu central).
//! 2. General age modifier for global/technique/mental/tactique/precision.
//! 3. Steeper athletic modifier for vitesse/physique.
//! 4. score = round(base × modifier), clamped to 0–100.
//! 5. Text lists by position, plus one recommendation per age bracket.

use crate::analysis::models::{PlayerAnalysis, PlayerProfile, Position};
use crate::llm_client::prompts::UNSPECIFIED;

/// Position used for the base vector when the submitted role is unrecognized.
pub const DEFAULT_POSITION: Position = Position::CentralMidfielder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseScores {
    pub global: u8,
    pub technique: u8,
    pub speed: u8,
    pub physical: u8,
    pub mental: u8,
    pub tactical: u8,
    pub precision: u8,
}

const fn scores(
    global: u8,
    technique: u8,
    speed: u8,
    physical: u8,
    mental: u8,
    tactical: u8,
    precision: u8,
) -> BaseScores {
    BaseScores {
        global,
        technique,
        speed,
        physical,
        mental,
        tactical,
        precision,
    }
}

pub fn base_scores(position: Option<Position>) -> BaseScores {
    match position.unwrap_or(DEFAULT_POSITION) {
        Position::Goalkeeper => scores(75, 70, 60, 80, 85, 75, 90),
        Position::CentreBack => scores(72, 65, 70, 85, 80, 85, 75),
        Position::RightBack | Position::LeftBack => scores(74, 70, 80, 75, 75, 80, 78),
        Position::DefensiveMidfielder => scores(76, 75, 70, 80, 85, 90, 80),
        Position::CentralMidfielder => scores(78, 85, 75, 75, 85, 90, 85),
        Position::AttackingMidfielder => scores(79, 90, 75, 70, 85, 85, 88),
        Position::RightWinger | Position::LeftWinger => scores(77, 85, 90, 70, 75, 75, 80),
        Position::Striker => scores(76, 80, 85, 75, 80, 70, 90),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Age policy
// ────────────────────────────────────────────────────────────────────────────

/// Development stage used to tailor recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBracket {
    /// under 18
    Youth,
    /// 18 – 20
    Developing,
    /// 21 – 27
    Peak,
    /// 28 and over
    Veteran,
}

impl AgeBracket {
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=17 => AgeBracket::Youth,
            18..=20 => AgeBracket::Developing,
            21..=27 => AgeBracket::Peak,
            _ => AgeBracket::Veteran,
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            AgeBracket::Youth => "Privilégier l'apprentissage et la progression en formation",
            AgeBracket::Developing => "Rechercher du temps de jeu régulier au niveau senior",
            AgeBracket::Peak => "Viser un niveau de compétition supérieur",
            AgeBracket::Veteran => "Capitaliser sur l'expérience acquise et guider les plus jeunes",
        }
    }
}

/// Multiplier for global, technique, mental, tactique and precision.
/// Unknown age is scored as prime age.
pub fn age_modifier(age: Option<u32>) -> f32 {
    match age {
        None => 1.0,
        Some(0..=17) => 0.80,
        Some(18..=20) => 0.90,
        Some(21..=24) => 1.00,
        Some(25..=29) => 0.95,
        Some(_) => 0.85,
    }
}

/// Steeper multiplier for vitesse and physique, which peak later and decline
/// earlier than the other criteria.
pub fn athletic_modifier(age: Option<u32>) -> f32 {
    match age {
        None => 1.0,
        Some(0..=17) => 0.75,
        Some(18..=20) => 0.88,
        Some(21..=24) => 1.05,
        Some(25..=27) => 1.00,
        Some(28..=29) => 0.90,
        Some(_) => 0.78,
    }
}

/// Potential label; brackets are finer than the modifier brackets.
pub fn potential_label(age: Option<u32>) -> &'static str {
    match age {
        None => "Potentiel à confirmer - Âge non renseigné",
        Some(0..=17) => "Très prometteur - Potentiel énorme",
        Some(18..=20) => "Très prometteur - Marge de progression importante",
        Some(21..=24) => "Bon potentiel - Phase de développement",
        Some(25..=27) => "Expérimenté - Pic de performance",
        Some(_) => "Expérimenté - Sagesse du jeu",
    }
}

fn scale(base: u8, modifier: f32) -> u8 {
    (f32::from(base) * modifier).round().clamp(0.0, 100.0) as u8
}

// ────────────────────────────────────────────────────────────────────────────
// Text tables
// ────────────────────────────────────────────────────────────────────────────

pub fn strengths(position: Option<Position>) -> &'static [&'static str] {
    match position {
        Some(Position::Goalkeeper) => &["Réflexes excellents", "Bon placement", "Leadership naturel"],
        Some(Position::CentreBack) => &["Solide dans les duels", "Bon jeu aérien", "Lecture du jeu"],
        Some(Position::RightBack) | Some(Position::LeftBack) => &[
            "Volume de course",
            "Qualité de centre",
            "Discipline défensive",
        ],
        Some(Position::DefensiveMidfielder) => &[
            "Récupération de balle",
            "Sens du placement",
            "Sobriété à la relance",
        ],
        Some(Position::CentralMidfielder) => &["Vision du jeu", "Polyvalence", "Récupération de balle"],
        Some(Position::AttackingMidfielder) => &["Créativité", "Technique raffinée", "Passes décisives"],
        Some(Position::RightWinger) | Some(Position::LeftWinger) => &[
            "Vitesse de percussion",
            "Dribble en un contre un",
            "Provocation balle au pied",
        ],
        Some(Position::Striker) => &["Sens du but", "Déplacements intelligents", "Finition précise"],
        None => &["Technique solide", "Bonne mentalité", "Potentiel intéressant"],
    }
}

pub fn weaknesses(position: Option<Position>) -> &'static [&'static str] {
    match position {
        Some(Position::Goalkeeper) => &["Jeu au pied à améliorer", "Sorties aériennes"],
        Some(Position::CentreBack) => &["Vitesse limitée", "Jeu long à travailler"],
        Some(Position::RightBack) | Some(Position::LeftBack) => {
            &["Replacement défensif", "Choix dans le dernier geste"]
        }
        Some(Position::DefensiveMidfielder) => &["Projection vers l'avant", "Jeu entre les lignes"],
        Some(Position::CentralMidfielder) => &["Finition à améliorer", "Intensité physique"],
        Some(Position::AttackingMidfielder) => &["Aspect défensif", "Régularité"],
        Some(Position::RightWinger) | Some(Position::LeftWinger) => {
            &["Repli défensif", "Efficacité devant le but"]
        }
        Some(Position::Striker) => &["Jeu dos au but", "Participation au jeu"],
        None => &["Régularité à améliorer", "Condition physique"],
    }
}

fn position_recommendations(position: Option<Position>) -> &'static [&'static str] {
    match position {
        Some(Position::Goalkeeper) => &[
            "Travailler le jeu au pied sous pression",
            "Multiplier les exercices de sorties aériennes",
        ],
        Some(Position::CentreBack) => &[
            "Développer la relance longue",
            "Améliorer l'explosivité sur les premiers mètres",
        ],
        Some(Position::RightBack) | Some(Position::LeftBack) => &[
            "Soigner la qualité des centres",
            "Travailler les transitions défensives",
        ],
        Some(Position::DefensiveMidfielder) => &[
            "Oser la passe verticale",
            "Renforcer le jeu de tête dans les duels",
        ],
        Some(Position::CentralMidfielder) => &[
            "Travailler la frappe de loin",
            "Augmenter l'intensité dans les duels",
        ],
        Some(Position::AttackingMidfielder) => &[
            "Renforcer le pressing à la perte du ballon",
            "Gagner en régularité sur 90 minutes",
        ],
        Some(Position::RightWinger) | Some(Position::LeftWinger) => &[
            "Travailler la finition du pied faible",
            "Participer davantage au repli défensif",
        ],
        Some(Position::Striker) => &[
            "Travailler le jeu en pivot dos au but",
            "Participer davantage à la construction",
        ],
        None => &[
            "Continuer le travail technique quotidien",
            "Améliorer la condition physique générale",
        ],
    }
}

/// Position recommendations followed by the age-bracket line (if the age is known).
pub fn recommendations(position: Option<Position>, age: Option<u32>) -> Vec<String> {
    let mut items: Vec<String> = position_recommendations(position)
        .iter()
        .map(|s| s.to_string())
        .collect();
    if let Some(age) = age {
        items.push(AgeBracket::from_age(age).recommendation().to_string());
    }
    items
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Composition
// ────────────────────────────────────────────────────────────────────────────

fn role_label(profile: &PlayerProfile) -> &str {
    profile
        .recognized_position()
        .map(Position::label)
        .or(profile.position_text())
        .unwrap_or(UNSPECIFIED)
}

/// Generic position paragraph, also used to fill a model answer that omits it.
pub fn describe_position(profile: &PlayerProfile) -> String {
    let role = role_label(profile);
    match profile.age {
        Some(age) => format!(
            "Analyse pour {role} de {age} ans. Profil adapté au poste avec des axes d'amélioration identifiés."
        ),
        None => format!(
            "Analyse pour {role}. Profil adapté au poste avec des axes d'amélioration identifiés."
        ),
    }
}

/// Builds the full fallback analysis for a profile. Never fails.
pub fn fallback_analysis(profile: &PlayerProfile) -> PlayerAnalysis {
    let position = profile.recognized_position();
    let base = base_scores(position);
    let general = age_modifier(profile.age);
    let athletic = athletic_modifier(profile.age);

    let role = role_label(profile);
    let position_analysis = describe_position(profile);

    let summary = profile.display_name().map(|name| {
        let club = profile.club_text().unwrap_or(UNSPECIFIED);
        format!(
            "Analyse de {name}, {role} ({club}). Évaluation établie à partir du poste et de l'âge."
        )
    });

    PlayerAnalysis {
        global_score: scale(base.global, general),
        technique: scale(base.technique, general),
        speed: scale(base.speed, athletic),
        physical: scale(base.physical, athletic),
        mental: scale(base.mental, general),
        tactical: scale(base.tactical, general),
        precision: scale(base.precision, general),
        strengths: to_owned_list(strengths(position)),
        weaknesses: to_owned_list(weaknesses(position)),
        recommendations: recommendations(position, profile.age),
        position_analysis,
        potential: potential_label(profile.age).to_string(),
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_deterministic() {
        let profile = PlayerProfile::new("Test Player", "Ailier gauche", 22, Some("AS Exemple"));
        assert_eq!(fallback_analysis(&profile), fallback_analysis(&profile));
    }

    #[test]
    fn test_young_striker_scores_lower_athletically() {
        let young = fallback_analysis(&PlayerProfile::new("A", "Attaquant", 17, None));
        let prime = fallback_analysis(&PlayerProfile::new("A", "Attaquant", 23, None));
        assert!(young.speed < prime.speed, "{} vs {}", young.speed, prime.speed);
        assert!(young.physical < prime.physical);
    }

    #[test]
    fn test_veteran_declines_faster_athletically() {
        let prime = fallback_analysis(&PlayerProfile::new("A", "Ailier droit", 23, None));
        let veteran = fallback_analysis(&PlayerProfile::new("A", "Ailier droit", 33, None));
        let speed_drop = prime.speed - veteran.speed;
        let technique_drop = prime.technique - veteran.technique;
        assert!(speed_drop > technique_drop);
    }

    #[test]
    fn test_all_positions_and_ages_stay_in_range() {
        for position in Position::ALL {
            for age in 1..=60 {
                let analysis =
                    fallback_analysis(&PlayerProfile::new("A", position.label(), age, None));
                assert!(analysis.scores().iter().all(|s| *s <= 100));
                assert_eq!(analysis.strengths.len(), 3);
                assert_eq!(analysis.weaknesses.len(), 2);
                assert_eq!(analysis.recommendations.len(), 3);
            }
        }
    }

    #[test]
    fn test_unknown_position_uses_default_vector_and_generic_text() {
        let analysis = fallback_analysis(&PlayerProfile::new("A", "Libéro", 23, None));
        let midfield = base_scores(Some(DEFAULT_POSITION));
        assert_eq!(analysis.global_score, midfield.global);
        assert_eq!(analysis.strengths, to_owned_list(strengths(None)));
        assert!(analysis.position_analysis.contains("Libéro"));
    }

    #[test]
    fn test_age_modifier_brackets() {
        assert_eq!(age_modifier(Some(17)), 0.80);
        assert_eq!(age_modifier(Some(18)), 0.90);
        assert_eq!(age_modifier(Some(21)), 1.00);
        assert_eq!(age_modifier(Some(25)), 0.95);
        assert_eq!(age_modifier(Some(30)), 0.85);
        assert_eq!(age_modifier(None), 1.00);
    }

    #[test]
    fn test_potential_label_brackets() {
        assert!(potential_label(Some(16)).contains("énorme"));
        assert!(potential_label(Some(19)).contains("Marge"));
        assert!(potential_label(Some(22)).contains("développement"));
        assert!(potential_label(Some(26)).contains("Pic"));
        assert!(potential_label(Some(31)).contains("Sagesse"));
    }

    #[test]
    fn test_age_bracket_appends_recommendation() {
        let youth = recommendations(Some(Position::Striker), Some(16));
        let veteran = recommendations(Some(Position::Striker), Some(32));
        assert_eq!(youth[..2], veteran[..2]);
        assert_ne!(youth[2], veteran[2]);
        assert_eq!(
            recommendations(Some(Position::Striker), None).len(),
            2,
            "no bracket line without an age"
        );
    }

    #[test]
    fn test_missing_age_scores_as_prime() {
        let profile = PlayerProfile {
            name: Some("Anonyme".to_string()),
            position: Some("Gardien".to_string()),
            ..Default::default()
        };
        let analysis = fallback_analysis(&profile);
        assert_eq!(analysis.global_score, 75);
        assert!(analysis.potential.contains("non renseigné"));
    }

    #[test]
    fn test_summary_mentions_name_and_club() {
        let analysis =
            fallback_analysis(&PlayerProfile::new("Test Player", "Gardien", 24, Some("FC Example")));
        let summary = analysis.summary.unwrap();
        assert!(summary.contains("Test Player"));
        assert!(summary.contains("FC Example"));
    }
}
