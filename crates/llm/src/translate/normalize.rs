//! In-place normalization of an inbound Chat Completions request.
//!
//! Array content parts are already flattened during deserialization; what
//! remains is dropping tool types the upstream cannot execute and fixing up
//! the legacy flat tool_choice shape.

use crate::messages::openai::{ChatCompletionRequest, FunctionChoice, ToolChoice};

pub(crate) fn normalize(request: &mut ChatCompletionRequest) {
    if let Some(tools) = request.tools.take() {
        let total = tools.len();
        let functions: Vec<_> = tools.into_iter().filter(|tool| tool.tool_type == "function").collect();

        if functions.len() != total {
            log::debug!("Dropped {} non-function tools from the request", total - functions.len());
        }

        request.tools = (!functions.is_empty()).then_some(functions);
    }

    if let Some(ToolChoice::NamedFlat { name, .. }) = &request.tool_choice {
        request.tool_choice = Some(ToolChoice::Specific {
            choice_type: "function".to_string(),
            function: FunctionChoice { name: name.clone() },
        });
    }
}
