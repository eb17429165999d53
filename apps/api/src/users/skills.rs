//! Skill-gap analysis for course suggestions.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::models::lenient;
use crate::store::Document;

/// Most gaps handed to the advisor.
pub const MAX_GAPS: usize = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TechStackOnly {
    #[serde(default, deserialize_with = "lenient::list")]
    tech_stack: Vec<String>,
}

/// Tech-stack keywords the saved jobs ask for that the user does not list,
/// most requested first. Matching ignores case; the first spelling seen is kept.
pub fn skill_gaps(skills: &[String], saved_jobs: &[Document]) -> Vec<String> {
    let known: HashSet<String> = skills.iter().map(|s| s.trim().to_lowercase()).collect();

    // lower-cased keyword -> (display spelling, count, first seen)
    let mut counts: HashMap<String, (String, usize, usize)> = HashMap::new();
    let mut seen = 0;
    for doc in saved_jobs {
        let Ok(job) = doc.decode::<TechStackOnly>() else {
            continue;
        };
        // A keyword repeated within one job counts once.
        let mut in_job = HashSet::new();
        for keyword in job.tech_stack {
            let key = keyword.to_lowercase();
            if known.contains(&key) || !in_job.insert(key.clone()) {
                continue;
            }
            let entry = counts.entry(key).or_insert_with(|| {
                seen += 1;
                (keyword, 0, seen)
            });
            entry.1 += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(MAX_GAPS)
        .map(|(name, _, _)| name)
        .collect()
}
