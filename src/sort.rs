use std::cmp::Ordering;

use crate::filter::Searchable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Column-header sort state: one key, one direction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction,
        }
    }

    /// Header click: same column flips direction, another column starts ascending.
    pub fn toggle(&mut self, key: &str) {
        if self.key.as_deref() == Some(key) {
            self.direction = self.direction.flipped();
        } else {
            self.key = Some(key.to_string());
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn apply<T: Searchable>(&self, records: &mut [T]) {
        let Some(key) = self.key.as_deref() else {
            return;
        };
        records.sort_by(|a, b| {
            let left = a.field(key).unwrap_or_default();
            let right = b.field(key).unwrap_or_default();
            let ordering = collate(&left, &right);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

/// Returns a sorted copy of `records`.
pub fn sorted<T: Searchable + Clone>(records: &[T], state: &SortState) -> Vec<T> {
    let mut out = records.to_vec();
    state.apply(&mut out);
    out
}

/// French-aware string comparison: accents and case are ignored first,
/// then the raw text breaks ties. Digits compare as characters.
pub fn collate(left: &str, right: &str) -> Ordering {
    fold(left)
        .cmp(&fold(right))
        .then_with(|| left.cmp(right))
}

fn fold(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' | 'À' | 'Á' | 'Â' | 'Ä' | 'Ã' | 'Å' => out.push('a'),
            'ç' | 'Ç' => out.push('c'),
            'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => out.push('e'),
            'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => out.push('i'),
            'ñ' | 'Ñ' => out.push('n'),
            'ò' | 'ó' | 'ô' | 'ö' | 'õ' | 'Ò' | 'Ó' | 'Ô' | 'Ö' | 'Õ' => out.push('o'),
            'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => out.push('u'),
            'ÿ' | 'Ÿ' => out.push('y'),
            'œ' | 'Œ' => out.push_str("oe"),
            'æ' | 'Æ' => out.push_str("ae"),
            other => out.extend(other.to_lowercase()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Name(&'static str);

    impl Searchable for Name {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.0]
        }

        fn field(&self, _key: &str) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn names(list: &[Name]) -> Vec<&'static str> {
        list.iter().map(|n| n.0).collect()
    }

    #[test]
    fn accents_sort_with_their_base_letter() {
        let list = vec![Name("Zoé"), Name("élodie"), Name("Emma"), Name("Daouda")];
        let out = sorted(&list, &SortState::by("nom", SortDirection::Ascending));
        assert_eq!(names(&out), vec!["Daouda", "élodie", "Emma", "Zoé"]);
    }

    #[test]
    fn toggle_flips_then_resets_on_new_column() {
        let mut state = SortState::default();
        state.toggle("nom");
        assert_eq!(state.direction, SortDirection::Ascending);
        state.toggle("nom");
        assert_eq!(state.direction, SortDirection::Descending);
        state.toggle("email");
        assert_eq!(state.key.as_deref(), Some("email"));
        assert_eq!(state.direction, SortDirection::Ascending);
    }

    #[test]
    fn numbers_are_not_numeric_aware() {
        assert_eq!(collate("10", "9"), Ordering::Less);
    }

    #[test]
    fn no_key_keeps_order() {
        let list = vec![Name("b"), Name("a")];
        assert_eq!(names(&sorted(&list, &SortState::default())), vec!["b", "a"]);
    }
}
