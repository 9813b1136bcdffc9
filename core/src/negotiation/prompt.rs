//! Prompt builder: personality, scenario and transcript to a single prompt

use super::persona::{Mandate, Scenario};
use super::product::percent_of;
use super::session::SessionState;
use super::transcript::Speaker;
use crate::error::Result;
use crate::llm::LlmMessage;
use handlebars::Handlebars;
use serde_json::json;

const TEMPLATE_NAME: &str = "negotiation";

const NEGOTIATION_TEMPLATE: &str = "\
You are {{persona.name}} ({{persona.personality_type}}), the {{role}} negotiating for {{product}}.
Your traits: {{persona.traits}}.
{{#if persona.catchphrases}}Phrases you like to use:
{{#each persona.catchphrases}}- \"{{this}}\"
{{/each}}{{/if}}
Market price: {{market_price}}. Fair price: {{fair_price}}.
Rules:
{{#each rules}}- {{this}}
{{/each}}
Round {{round}} of {{max_rounds}}.{{#if last_offer}} Your last offer: {{last_offer}}.{{/if}}{{#if counter_offer}} The {{counterpart}}'s latest price: {{counter_offer}}.{{/if}}

Conversation so far:
{{#if opening}}{{agent_label}}: {{opening}}
{{/if}}{{#each turns}}{{speaker}}: {{text}}
{{/each}}
Reply to the {{counterpart}} as the {{role}} in 1-2 short, persuasive sentences. \
Any price you mention must match your decision exactly.
End your reply with exactly one final line, either
DECISION: ACCEPT
or
DECISION: COUNTER <price>
";

/// Renders negotiation prompts
pub struct PromptBuilder {
    registry: Handlebars<'static>,
}

impl PromptBuilder {
    /// Create a builder with the negotiation template registered
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);

        registry.register_template_string(TEMPLATE_NAME, NEGOTIATION_TEMPLATE)?;

        Ok(Self { registry })
    }

    /// Render the prompt for the current round.
    ///
    /// Pure with respect to its inputs: the same scenario and state always
    /// render the same text.
    pub fn render(&self, scenario: &Scenario, state: &SessionState) -> Result<String> {
        let role = scenario.role();
        let agent_label = role.label();
        let human_label = role.counterpart().label();

        let turns: Vec<_> = state
            .transcript()
            .turns()
            .iter()
            .map(|turn| {
                let speaker = match turn.speaker {
                    Speaker::Human => human_label,
                    Speaker::Agent => agent_label,
                };
                json!({ "speaker": speaker, "text": turn.text })
            })
            .collect();

        let data = json!({
            "persona": {
                "name": scenario.personality.name,
                "personality_type": scenario.personality.personality_type,
                "traits": scenario.personality.traits.join(", "),
                "catchphrases": scenario.personality.catchphrases,
            },
            "role": role.to_string(),
            "counterpart": role.counterpart().to_string(),
            "agent_label": agent_label,
            "product": format!("{} from {}", scenario.product.describe(), scenario.product.origin),
            "market_price": scenario.money(scenario.product.base_market_price),
            "fair_price": scenario.money(scenario.fair_price()),
            "rules": rules(scenario),
            "round": state.current_round(),
            "max_rounds": state.max_rounds(),
            "last_offer": state.last_agent_offer().map(|p| scenario.money(p)),
            "counter_offer": state.pending_human_offer().map(|p| scenario.money(p)),
            "opening": state.opening().map(|turn| turn.text.clone()),
            "turns": turns,
        });

        Ok(self.registry.render(TEMPLATE_NAME, &data)?)
    }

    /// Messages for a chat request: personality system prompt plus the rendered prompt
    pub fn messages(&self, scenario: &Scenario, state: &SessionState) -> Result<Vec<LlmMessage>> {
        Ok(vec![
            LlmMessage::system(scenario.personality.system_prompt.clone()),
            LlmMessage::user(self.render(scenario, state)?),
        ])
    }
}

fn rules(scenario: &Scenario) -> Vec<String> {
    let fair = scenario.fair_price();
    match &scenario.mandate {
        Mandate::Buyer(m) => vec![
            format!(
                "Protect your budget: never offer or accept more than {}.",
                scenario.money(m.budget)
            ),
            format!(
                "Never offer less than {}.",
                scenario.money(percent_of(fair, m.floor_pct).max(1))
            ),
            "Aim for the best deal; accept only when the price is within budget and close to fair value."
                .to_string(),
        ],
        Mandate::Seller(m) => vec![
            "Never sell at or below the market price; always profit.".to_string(),
            format!(
                "Your minimum acceptable price is {}.",
                scenario.money(m.minimum_price)
            ),
            "Never increase your price after lowering it.".to_string(),
        ],
    }
}
