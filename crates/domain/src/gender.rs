//! Survey gender targeting.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Masculino,
    Femenino,
    Otro,
}

/// What the API accepts for `genero`: either an explicit list or a single
/// convenience keyword.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GeneroInput {
    Lista(Vec<Gender>),
    Palabra(String),
}

/// Expand a `genero` input into the explicit list that gets stored.
///
/// Keywords: `todos` covers all three values, `ambos` the two binary ones.
/// Unrecognized keywords expand to the empty list (no restriction recorded).
/// Surveys always store the explicit list; create and update both go through
/// here so the two paths cannot drift.
pub fn expand_genero(input: Option<GeneroInput>) -> Vec<Gender> {
    match input {
        Some(GeneroInput::Lista(list)) => list,
        Some(GeneroInput::Palabra(word)) => match word.trim().to_lowercase().as_str() {
            "todos" => vec![Gender::Masculino, Gender::Femenino, Gender::Otro],
            "ambos" => vec![Gender::Masculino, Gender::Femenino],
            "masculino" => vec![Gender::Masculino],
            "femenino" => vec![Gender::Femenino],
            "otro" => vec![Gender::Otro],
            _ => Vec::new(),
        },
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palabra(s: &str) -> Option<GeneroInput> {
        Some(GeneroInput::Palabra(s.to_string()))
    }

    #[test]
    fn todos_expands_to_all_three() {
        assert_eq!(
            expand_genero(palabra("todos")),
            vec![Gender::Masculino, Gender::Femenino, Gender::Otro]
        );
    }

    #[test]
    fn ambos_expands_to_binary_pair() {
        assert_eq!(
            expand_genero(palabra("ambos")),
            vec![Gender::Masculino, Gender::Femenino]
        );
    }

    #[test]
    fn single_values_expand_to_singletons() {
        assert_eq!(expand_genero(palabra("masculino")), vec![Gender::Masculino]);
        assert_eq!(expand_genero(palabra("Femenino")), vec![Gender::Femenino]);
        assert_eq!(expand_genero(palabra("otro")), vec![Gender::Otro]);
    }

    #[test]
    fn unrecognized_keyword_expands_to_empty() {
        assert_eq!(expand_genero(palabra("cualquiera")), Vec::<Gender>::new());
        assert_eq!(expand_genero(palabra("")), Vec::<Gender>::new());
        assert_eq!(expand_genero(None), Vec::<Gender>::new());
    }

    #[test]
    fn explicit_list_is_kept_as_is() {
        assert_eq!(
            expand_genero(Some(GeneroInput::Lista(vec![Gender::Otro]))),
            vec![Gender::Otro]
        );
    }
}
