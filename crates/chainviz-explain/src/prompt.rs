//! Provider prompt rendering
//!
//! Prompts are Handlebars templates rendered from catalog metadata. Strict
//! mode is on, so every template variable is always supplied (as `null` when
//! absent) and a typo in a template fails loudly instead of rendering blank.

use crate::catalog::FlowDefinition;
use crate::error::PromptError;
use chainviz_types::{DiagramEdge, StepMetadata};
use handlebars::Handlebars;
use serde_json::json;

const STEP_TEMPLATE: &str = include_str!("../templates/step.hbs");
const OVERVIEW_TEMPLATE: &str = include_str!("../templates/overview.hbs");

/// Renders step and overview prompts
#[derive(Debug)]
pub struct PromptBuilder {
    handlebars: Handlebars<'static>,
}

impl PromptBuilder {
    pub fn new() -> Result<Self, PromptError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string("step", STEP_TEMPLATE)?;
        handlebars.register_template_string("overview", OVERVIEW_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    /// Prompt for step 0 (overview) or a numbered step
    pub fn build(
        &self,
        flow: &FlowDefinition,
        step: u32,
        context: Option<&str>,
    ) -> Result<String, PromptError> {
        if step == 0 {
            return self.overview_prompt(flow, context);
        }
        let metadata = flow.step(step).ok_or_else(|| PromptError::UnknownStep {
            flow: flow.flow.clone(),
            step,
        })?;
        self.step_prompt(flow, metadata)
    }

    pub fn step_prompt(
        &self,
        flow: &FlowDefinition,
        step: &StepMetadata,
    ) -> Result<String, PromptError> {
        let data = json!({
            "flow": { "title": flow.title, "summary": flow.summary },
            "step": {
                "step": step.step,
                "title": step.title,
                "description": step.description,
                "rationale": step.rationale,
                "code": step.code.as_deref().map(str::trim_end),
            },
            "active_nodes": readable_nodes(&step.active_nodes),
            "active_edges": readable_edges(&step.active_edges),
        });
        Ok(self.handlebars.render("step", &data)?)
    }

    pub fn overview_prompt(
        &self,
        flow: &FlowDefinition,
        context: Option<&str>,
    ) -> Result<String, PromptError> {
        let steps: Vec<_> = flow
            .steps
            .iter()
            .map(|s| json!({ "step": s.step, "title": s.title, "description": s.description }))
            .collect();
        let data = json!({
            "flow": { "title": flow.title, "summary": flow.summary },
            "step_count": flow.step_count(),
            "steps": steps,
            "context": context.map(str::trim).filter(|c| !c.is_empty()),
        });
        Ok(self.handlebars.render("overview", &data)?)
    }
}

fn readable_nodes(nodes: &[String]) -> String {
    if nodes.is_empty() {
        "none".to_string()
    } else {
        nodes.join(", ")
    }
}

fn readable_edges(edges: &[DiagramEdge]) -> String {
    if edges.is_empty() {
        "none".to_string()
    } else {
        edges
            .iter()
            .map(DiagramEdge::describe)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
