use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Message of the fortune appended to every `/fortunes` response. Never persisted.
pub const ADDITIONAL_FORTUNE: &str = "Additional fortune added at request time.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct World {
    pub id: i64,
    #[serde(rename = "randomNumber")]
    #[sqlx(rename = "randomnumber")]
    pub random_number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Fortune {
    pub id: i64,
    pub message: String,
}

impl Fortune {
    pub fn additional() -> Self {
        Self {
            id: 0,
            message: String::from(ADDITIONAL_FORTUNE),
        }
    }
}

// Fortunes order by message; id only breaks ties so the ordering agrees with Eq.
impl Ord for Fortune {
    fn cmp(&self, other: &Self) -> Ordering {
        self.message
            .cmp(&other.message)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Fortune {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_serializes_with_benchmark_field_names() {
        let world = World {
            id: 42,
            random_number: 7,
        };
        assert_eq!(
            serde_json::to_string(&world).unwrap(),
            r#"{"id":42,"randomNumber":7}"#
        );
    }

    #[test]
    fn fortunes_sort_by_message() {
        let mut fortunes = vec![
            Fortune {
                id: 1,
                message: String::from("b"),
            },
            Fortune::additional(),
            Fortune {
                id: 2,
                message: String::from("<script>"),
            },
        ];
        fortunes.sort();
        let messages: Vec<_> = fortunes.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["<script>", ADDITIONAL_FORTUNE, "b"]);
    }
}
