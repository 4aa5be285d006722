//! Exploration budget and interaction safety limits

use serde::{Deserialize, Serialize};

/// Built-in patterns the explorer never interacts with, regardless of user
/// configuration. Destructive, network-mutating, purchase and advertising
/// terms across the languages the mirrored apps commonly ship in.
pub const SAFETY_SKIP_PATTERNS: &[&str] = &[
    // destructive (en)
    "delete",
    "remove",
    "erase",
    "reset",
    "clear all",
    "format",
    "sign out",
    "log out",
    "logout",
    "deactivate",
    "unsubscribe",
    "block",
    "report",
    // network / outward-facing (en)
    "send",
    "call",
    "share",
    "post",
    "publish",
    "invite",
    "upload",
    // purchase (en)
    "buy",
    "purchase",
    "subscribe",
    "pay",
    "checkout",
    "add to cart",
    "order now",
    "upgrade",
    // ads (en)
    "sponsored",
    "advertisement",
    "learn more about this ad",
    // fr
    "supprimer",
    "effacer",
    "réinitialiser",
    "déconnexion",
    "se déconnecter",
    "envoyer",
    "appeler",
    "acheter",
    "payer",
    "s'abonner",
    "sponsorisé",
    // de
    "löschen",
    "entfernen",
    "zurücksetzen",
    "abmelden",
    "senden",
    "anrufen",
    "kaufen",
    "bezahlen",
    "abonnieren",
    "gesponsert",
    // es
    "eliminar",
    "borrar",
    "restablecer",
    "cerrar sesión",
    "enviar",
    "llamar",
    "comprar",
    "pagar",
    "suscribirse",
    "patrocinado",
];

/// Limits for one exploration run.
///
/// The wall-clock ceiling is checked at the top of every tick; the per-screen
/// caps bound interactions, scroll attempts and scout taps on a single screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplorationBudget {
    /// Maximum discovery depth for frontier entries
    pub max_depth: u32,
    /// Maximum number of distinct screens in the graph
    pub max_screens: usize,
    /// Wall-clock ceiling in seconds
    pub max_seconds: u64,
    /// Planned taps per screen before the screen is considered done
    pub max_interactions_per_screen: u32,
    /// Reveal swipes attempted before giving up on a screen
    pub scroll_attempts_per_screen: u32,
    /// Scout taps (tap-and-backtrack probes) per screen
    pub scout_taps_per_screen: u32,
    /// User-supplied patterns, merged with [`SAFETY_SKIP_PATTERNS`]
    pub skip_patterns: Vec<String>,
}

impl Default for ExplorationBudget {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_screens: 30,
            max_seconds: 300,
            max_interactions_per_screen: 8,
            scroll_attempts_per_screen: 2,
            scout_taps_per_screen: 3,
            skip_patterns: Vec::new(),
        }
    }
}

impl ExplorationBudget {
    /// True if the element text matches a user or built-in skip pattern.
    ///
    /// Matching is case-insensitive substring containment, so "Delete Account"
    /// and "Supprimer le compte" both hit.
    pub fn should_skip(&self, text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return false;
        }
        SAFETY_SKIP_PATTERNS
            .iter()
            .any(|p| lower.contains(p))
            || self
                .skip_patterns
                .iter()
                .any(|p| !p.is_empty() && lower.contains(&p.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_safety_patterns() {
        let budget = ExplorationBudget::default();
        assert!(budget.should_skip("Delete Account"));
        assert!(budget.should_skip("Sign Out"));
        assert!(budget.should_skip("Buy Now"));
        assert!(budget.should_skip("Supprimer le compte"));
        assert!(budget.should_skip("Konto löschen"));
        assert!(budget.should_skip("Cerrar sesión"));
        assert!(!budget.should_skip("General"));
        assert!(!budget.should_skip("Wi-Fi"));
    }

    #[test]
    fn test_user_patterns_merge() {
        let budget = ExplorationBudget {
            skip_patterns: vec!["Face ID".into()],
            ..Default::default()
        };
        assert!(budget.should_skip("Face ID & Passcode"));
        assert!(budget.should_skip("delete"));
    }

    #[test]
    fn test_empty_text_never_skipped() {
        let budget = ExplorationBudget::default();
        assert!(!budget.should_skip(""));
        assert!(!budget.should_skip("   "));
    }

    #[test]
    fn test_serde_defaults() {
        let budget: ExplorationBudget = serde_json::from_str("{\"maxDepth\": 5}").unwrap();
        assert_eq!(budget.max_depth, 5);
        assert_eq!(budget.max_screens, 30);
    }
}
