use serde::{Deserialize, Serialize};

/// One researcher profile, the unit of retrieval.
///
/// The JSON wire form matches the `researchers.json` array produced by the
/// upstream collectors; fields the collectors leave out default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Researcher {
    pub name: String,
    #[serde(default)]
    pub affiliation: String,
    #[serde(default)]
    pub research_areas: Vec<String>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub years: String,
    #[serde(default)]
    pub grant_amount: f64,
}

impl Researcher {
    /// Synthesize the description text used as embedding input.
    ///
    /// Field order is fixed (name, affiliation, research areas, then one line
    /// per project) so identical records embed identically across runs.
    /// Empty fields are left out rather than rendered as blanks.
    pub fn describe(&self) -> String {
        let mut text = String::new();

        let name = self.name.trim();
        if !name.is_empty() {
            text.push_str(name);
        }

        let affiliation = self.affiliation.trim();
        if !affiliation.is_empty() {
            if !text.is_empty() {
                text.push_str(" from ");
            }
            text.push_str(affiliation);
        }

        let areas: Vec<&str> = self
            .research_areas
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        if !areas.is_empty() {
            if !text.is_empty() {
                text.push_str(" researches ");
            }
            text.push_str(&areas.join(", "));
        }

        if !text.is_empty() {
            text.push_str(".\n");
        }

        for project in &self.projects {
            let title = project.title.trim();
            if title.is_empty() {
                continue;
            }
            text.push_str(&format!(
                "Project: {} ({}, {} PLN)\n",
                title,
                project.years.trim(),
                project.grant_amount
            ));
        }

        text
    }

    /// A record is degenerate when it yields no embedding text at all.
    /// Degenerate records are skipped at build time, never embedded.
    pub fn is_degenerate(&self) -> bool {
        self.describe().trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Researcher {
        Researcher {
            name: "Alice".to_string(),
            affiliation: "X".to_string(),
            research_areas: vec!["NLP".to_string()],
            projects: vec![Project {
                title: "Grammar induction".to_string(),
                years: "2019-2022".to_string(),
                grant_amount: 120000.0,
            }],
            source: "https://example.edu/alice".to_string(),
        }
    }

    #[test]
    fn describe_is_deterministic() {
        assert_eq!(alice().describe(), alice().describe());
    }

    #[test]
    fn describe_uses_fixed_field_order() {
        let text = alice().describe();
        let name_at = text.find("Alice").expect("name");
        let affiliation_at = text.find("X").expect("affiliation");
        let area_at = text.find("NLP").expect("area");
        let project_at = text.find("Grammar induction").expect("project");

        assert!(name_at < affiliation_at);
        assert!(affiliation_at < area_at);
        assert!(area_at < project_at);
        assert!(text.contains("(2019-2022, 120000 PLN)"));
    }

    #[test]
    fn empty_fields_are_left_out() {
        let record = Researcher {
            name: "Bob".to_string(),
            affiliation: String::new(),
            research_areas: vec![],
            projects: vec![],
            source: String::new(),
        };
        assert_eq!(record.describe(), "Bob.\n");
        assert!(!record.is_degenerate());
    }

    #[test]
    fn all_empty_record_is_degenerate() {
        let record = Researcher {
            name: "   ".to_string(),
            affiliation: String::new(),
            research_areas: vec!["".to_string()],
            projects: vec![Project {
                title: " ".to_string(),
                years: String::new(),
                grant_amount: 0.0,
            }],
            source: String::new(),
        };
        assert!(record.is_degenerate());
    }

    #[test]
    fn deserializes_minimal_record() {
        let record: Researcher =
            serde_json::from_str(r#"{"name":"Alice","affiliation":"X","research_areas":["NLP"],"projects":[]}"#)
                .expect("parse");
        assert_eq!(record.name, "Alice");
        assert_eq!(record.source, "");
        assert!(record.projects.is_empty());
    }
}
