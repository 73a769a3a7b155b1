//! Static catalogs - training goals and challenge kinds

/// Training goal a user or workout can aim at.
#[derive(Debug, Clone)]
pub struct GoalTag {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

pub const GOAL_TAGS: &[GoalTag] = &[
    GoalTag {
        id: "ganhar_massa",
        label: "Ganhar Massa",
        icon: "💪",
    },
    GoalTag {
        id: "perder_peso",
        label: "Perder Peso",
        icon: "🔥",
    },
    GoalTag {
        id: "definicao",
        label: "Definição",
        icon: "✨",
    },
    GoalTag {
        id: "forca",
        label: "Força",
        icon: "⚡",
    },
    GoalTag {
        id: "resistencia",
        label: "Resistência",
        icon: "🏃",
    },
    GoalTag {
        id: "condicionamento",
        label: "Condicionamento",
        icon: "❤️",
    },
];

/// Kind of goal a challenge counts toward.
#[derive(Debug, Clone)]
pub struct ChallengeKind {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub desc: &'static str,
}

pub const CHALLENGE_KINDS: &[ChallengeKind] = &[
    ChallengeKind {
        id: "treinos",
        label: "Treinos",
        icon: "💪",
        desc: "Complete X treinos",
    },
    ChallengeKind {
        id: "dias_consecutivos",
        label: "Dias Consecutivos",
        icon: "🔥",
        desc: "Treine X dias seguidos",
    },
    ChallengeKind {
        id: "exercicios",
        label: "Exercícios",
        icon: "⚡",
        desc: "Complete X exercícios",
    },
    ChallengeKind {
        id: "tempo",
        label: "Tempo Total",
        icon: "⏱️",
        desc: "Acumule X minutos de treino",
    },
    ChallengeKind {
        id: "personalizado",
        label: "Personalizado",
        icon: "✨",
        desc: "Crie seu próprio desafio",
    },
];

/// XP rewards a challenge creator can pick from.
pub const XP_REWARD_CHOICES: &[u64] = &[50, 100, 150, 200, 300, 500];

pub fn find_goal(id: &str) -> Option<&'static GoalTag> {
    GOAL_TAGS.iter().find(|g| g.id == id)
}

pub fn find_challenge_kind(id: &str) -> Option<&'static ChallengeKind> {
    CHALLENGE_KINDS.iter().find(|k| k.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_goal_known_ids() {
        for goal in GOAL_TAGS {
            assert!(find_goal(goal.id).is_some(), "goal {} missing", goal.id);
        }
    }

    #[test]
    fn test_find_goal_unknown_id() {
        assert!(find_goal("nadar").is_none());
    }

    #[test]
    fn test_find_challenge_kind_known_ids() {
        for kind in CHALLENGE_KINDS {
            assert_eq!(find_challenge_kind(kind.id).map(|k| k.id), Some(kind.id));
        }
    }

    #[test]
    fn test_catalogs_not_empty() {
        assert_eq!(GOAL_TAGS.len(), 6);
        assert_eq!(CHALLENGE_KINDS.len(), 5);
        assert_eq!(XP_REWARD_CHOICES.len(), 6);
    }
}
