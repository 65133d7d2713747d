//! Prompt templates — one per agent kind.
//!
//! Pure functions over their inputs: system instructions, the assembled
//! context, a bounded history window, and the query. The history window size
//! is explicit executor configuration, not a hidden truncation.

use waypoint_core::agent::AgentKind;
use waypoint_core::context::AssembledContext;
use waypoint_core::message::Message;

const TRAVEL_SUPPORT_SYSTEM: &str = "\
You are a helpful travel support agent for a travel agency.
Your role is to provide accurate, friendly, and helpful information about travel destinations,
itineraries, travel tips, and general travel advice.

Use the provided context documents to answer questions accurately. If the context doesn't contain
enough information to fully answer the question, say so and provide what information you can.

Keep responses concise and well-structured. Use bullet points or numbered lists for multiple
items, and keep paragraphs short. Always be friendly, professional, and helpful, and give
practical, actionable advice.";

const BOOKING_PAYMENTS_SYSTEM: &str = "\
You are a booking and payments specialist for a travel agency.
Your role is to answer questions about pricing, packages, payments, invoices, and booking costs.

The context below combines current pricing and availability information with our standing
booking-related policies (refunds, cancellation, payment terms). Ground every figure you quote
in the context; never invent prices. When policy terms affect the answer, state them explicitly.

Be precise, professional, and concise.";

const POLICY_SYSTEM: &str = "\
You are a policy and compliance specialist for a travel agency.
Your role is to provide accurate information about cancellation policies and refund terms,
terms of service, travel insurance, baggage policies, and other policy-related questions.

Use the provided policy documents to answer questions accurately. Always be precise and
reference specific policy terms when relevant. If a policy document doesn't contain
information about a specific question, clearly state that.

Be professional, clear, and ensure you're providing accurate policy information.";

/// The system instructions for an agent kind.
pub fn system_prompt(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::TravelSupport => TRAVEL_SUPPORT_SYSTEM,
        AgentKind::BookingPayments => BOOKING_PAYMENTS_SYSTEM,
        AgentKind::Policy => POLICY_SYSTEM,
    }
}

/// Render the final user turn: assembled context plus the query.
pub fn render_user_prompt(kind: AgentKind, context: &AssembledContext, query: &str) -> String {
    let context_heading = match kind {
        AgentKind::Policy => "Policy documents",
        AgentKind::BookingPayments => "Booking context (current information first, standing terms after)",
        AgentKind::TravelSupport => "Context from knowledge base",
    };

    if context.is_empty() {
        format!(
            "No supporting documents were found for this question.\n\nUser question: {query}\n\n\
             Answer from general knowledge of the agency's services, and be explicit about \
             anything you cannot confirm."
        )
    } else {
        format!(
            "{context_heading}:\n{}\n\nUser question: {query}\n\n\
             Provide a helpful, well-structured response based on the context above. If the \
             context doesn't fully answer the question, acknowledge this and provide the best \
             answer you can.",
            context.text
        )
    }
}

/// Assemble the full message sequence for one generation call.
///
/// History is rendered as-is, in its given order, limited to the trailing
/// `history_window` messages.
pub fn build_messages(
    kind: AgentKind,
    context: &AssembledContext,
    history: &[Message],
    query: &str,
    history_window: usize,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history_window + 2);
    messages.push(Message::system(system_prompt(kind)));

    let start = history.len().saturating_sub(history_window);
    for msg in &history[start..] {
        messages.push(msg.clone());
    }

    messages.push(Message::user(render_user_prompt(kind, context, query)));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::message::Role;

    fn context(text: &str) -> AssembledContext {
        AssembledContext {
            text: text.into(),
            chunks_included: 1,
            truncated: false,
        }
    }

    #[test]
    fn each_kind_has_distinct_instructions() {
        let prompts: Vec<&str> = AgentKind::ALL.iter().map(|k| system_prompt(*k)).collect();
        assert!(prompts[0].contains("travel support"));
        assert!(prompts[1].contains("booking and payments"));
        assert!(prompts[2].contains("policy and compliance"));
    }

    #[test]
    fn user_prompt_carries_context_and_query() {
        let rendered = render_user_prompt(
            AgentKind::Policy,
            &context("Refunds take 5 days."),
            "How long do refunds take?",
        );
        assert!(rendered.contains("Refunds take 5 days."));
        assert!(rendered.contains("How long do refunds take?"));
        assert!(rendered.contains("Policy documents"));
    }

    #[test]
    fn empty_context_is_stated_not_hidden() {
        let rendered =
            render_user_prompt(AgentKind::TravelSupport, &AssembledContext::empty(), "q");
        assert!(rendered.contains("No supporting documents"));
    }

    #[test]
    fn history_window_takes_trailing_messages_in_order() {
        let history = vec![
            Message::user("first"),
            Message::assistant("second"),
            Message::user("third"),
            Message::assistant("fourth"),
        ];
        let messages = build_messages(
            AgentKind::TravelSupport,
            &context("ctx"),
            &history,
            "now",
            2,
        );

        // system + 2 history + final user turn
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "third");
        assert_eq!(messages[2].content, "fourth");
        assert_eq!(messages[2].role, Role::Assistant);
        assert!(messages[3].content.contains("now"));
    }

    #[test]
    fn short_history_is_kept_whole() {
        let history = vec![Message::user("only")];
        let messages =
            build_messages(AgentKind::Policy, &context("ctx"), &history, "q", 10);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "only");
    }
}
