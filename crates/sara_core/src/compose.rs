use crate::model::Researcher;

/// Format retrieved records into the context block handed to the chat model.
/// One paragraph per record: headline line, one line per project, source line.
pub fn format_context(records: &[Researcher]) -> String {
    let mut context = String::new();
    for record in records {
        context.push_str(&format!(
            "{} ({}): {}\n",
            record.name,
            record.affiliation,
            record.research_areas.join(", ")
        ));
        for project in &record.projects {
            context.push_str(&format!(
                "- {} ({}) | {} PLN\n",
                project.title, project.years, project.grant_amount
            ));
        }
        context.push_str(&format!("Source: {}\n\n", record.source));
    }
    context
}

/// Assemble the final prompt around a context block. The chat-completion
/// call that consumes it lives outside this crate.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!("CONTEXT:\n{context}\nQUESTION:\n{question}\n\nANSWER:")
}
