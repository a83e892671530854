// All LLM prompt constants for the Analysis module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::analysis::models::PlayerProfile;
use crate::llm_client::prompts::{render_template, JSON_ONLY_INSTRUCTION, UNSPECIFIED};

/// Scouting rubric. Defines the six criteria the parser expects scores for.
pub const SCOUTING_SYSTEM: &str = "Tu es un scout professionnel de football avec 20 ans d'expérience.
Tu analyses les joueurs selon 6 critères précis, chacun noté de 0 à 100 :

TECHNIQUE (0-100) : Contrôle de balle, première touche, dribbles, gestes techniques
VITESSE (0-100) : Accélération, vitesse de pointe, réactivité, vivacité
PHYSIQUE (0-100) : Endurance, force, résistance, présence physique
MENTAL (0-100) : Prise de décision, concentration, leadership, gestion du stress
TACTIQUE (0-100) : Positionnement, lecture du jeu, discipline tactique
PRECISION (0-100) : Précision des passes, tirs cadrés, centres, coups de pied arrêtés

globalScore (0-100) est une note globale cohérente avec les six critères.";

/// Player prompt template.
/// Replace: {name}, {position}, {age}, {club}, {video}
pub const SCOUTING_PROMPT_TEMPLATE: &str = r#"Analyse ce joueur de football :

PROFIL :
- Nom : {name}
- Poste : {position}
- Âge : {age}
- Club : {club}
- Vidéo : {video}

CONTEXTE D'ANALYSE :
Basé sur son profil, son âge et son poste, fournis une analyse réaliste et constructive.

CRITÈRES PAR POSTE :
- Gardien : Réflexes, placement, relance, leadership
- Défenseur / Latéral : Marquage, duels, relance, anticipation
- Milieu : Vision, passes, récupération, polyvalence
- Ailier / Attaquant : Finition, déplacements, vitesse, technique

Réponds avec un objet JSON ayant EXACTEMENT ces clés :
{
  "globalScore": 75,
  "technique": 80,
  "vitesse": 70,
  "physique": 75,
  "mental": 85,
  "tactique": 78,
  "precision": 82,
  "strengths": ["Point fort 1", "Point fort 2", "Point fort 3"],
  "weaknesses": ["Point faible 1", "Point faible 2"],
  "recommendations": ["Conseil 1", "Conseil 2", "Conseil 3"],
  "positionAnalysis": "Analyse spécifique au poste",
  "potential": "Évaluation du potentiel",
  "summary": "Résumé en 2-3 phrases"
}

Sois précis et constructif dans tes recommandations. Adapte les scores selon l'âge et le niveau attendu."#;

/// The rendered system/user pair for one analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoutingPrompt {
    pub system: String,
    pub user: String,
}

/// Renders the prompt pair for a profile. Pure; absent fields become
/// placeholders so the prompt is always well-formed.
pub fn build_scouting_prompt(profile: &PlayerProfile) -> ScoutingPrompt {
    let age = profile
        .age
        .map(|a| format!("{a} ans"))
        .unwrap_or_else(|| UNSPECIFIED.to_string());
    let video = profile
        .video_ref
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNSPECIFIED);

    let user = render_template(
        SCOUTING_PROMPT_TEMPLATE,
        &[
            ("name", profile.display_name().unwrap_or(UNSPECIFIED)),
            ("position", profile.position_text().unwrap_or(UNSPECIFIED)),
            ("age", age.as_str()),
            ("club", profile.club_text().unwrap_or(UNSPECIFIED)),
            ("video", video),
        ],
    );

    ScoutingPrompt {
        system: format!("{SCOUTING_SYSTEM}\n\n{JSON_ONLY_INSTRUCTION}"),
        user,
    }
}
