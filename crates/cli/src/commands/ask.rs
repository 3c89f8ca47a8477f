//! `aerobrain ask`: Ask a single question from the terminal.

use aerobrain_agent::{AgentManager, AskRequest, AskResponse};
use aerobrain_core::message::ConversationId;
use aerobrain_core::retrieval::TenantId;

pub struct AskArgs {
    pub question: String,
    pub aircraft: Option<String>,
    pub ata: Option<String>,
    pub tenant: i64,
    pub conversation: Option<String>,
}

pub async fn run(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    let provider = aerobrain_gateway::completion_provider(&config);
    let store = aerobrain_gateway::open_vector_store(&config).await?;
    let agent = AgentManager::new(&config, store, provider);

    let response = agent.ask(build_request(args)).await;
    print_response(&response);

    Ok(())
}

fn build_request(args: AskArgs) -> AskRequest {
    let mut request = AskRequest::new(args.question, TenantId(args.tenant));
    if let Some(aircraft) = args.aircraft {
        request = request.with_aircraft(aircraft);
    }
    if let Some(ata) = args.ata {
        request = request.with_ata(ata);
    }
    if let Some(id) = args.conversation {
        request = request.with_conversation(ConversationId::from(id.as_str()));
    }
    request
}

fn print_response(response: &AskResponse) {
    println!();
    println!("{}", response.answer);
    println!();
    println!(
        "  tier: {}   confidence: {:.3}   conversation: {}",
        response.tier, response.confidence, response.conversation_id
    );

    if !response.sources.is_empty() {
        println!("  sources:");
        for (i, source) in response.sources.iter().enumerate() {
            println!(
                "    [{}] {} ({}, {}) score {:.3}",
                i + 1,
                source.doc_title,
                source.aircraft_model,
                source.doc_type,
                source.score
            );
        }
    }

    if let Some(error) = &response.metadata.error {
        eprintln!("  error: {error}");
    }
}
