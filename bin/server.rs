// Rent Ledger - Webhook Server
// Receives chat-callback POSTs (GroupMe bot format), runs the parsed
// command against the ledger, and replies - in the HTTP response always,
// and through the bot endpoint when GROUPME_BOT_ID is configured.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::env;
use std::sync::{Arc, Mutex};

use rent_ledger::{
    default_effective_month, execute, format_amounts_owed, parse_message, CommandOutcome, CsvGrid,
    LedgerEngine, ParseOutcome,
};

const REMINDER_MESSAGE: &str = "It's RENT TIME again for the month!\n\nPlease type \"/rent weeks-stayed <num weeks>\" to set how long you stayed this past month (otherwise, I'll assume you stayed for 4 weeks). In a few days, rents will be posted and you can type \"/rent show\" to see how much you owe";
const SICK_MESSAGE: &str = "🤒 Oh no - I'm feeling sick right now! Please try again when I'm feeling better (we'll send someone to patch me up)";
const UNRECOGNIZED_MESSAGE: &str = "Hmmm, I don't recognize that command (try typing \"/rent help\"?)";

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<LedgerEngine<CsvGrid>>>,
    bot_id: Option<String>,
    payment_note: Option<String>,
}

/// Incoming chat callback (GroupMe bot format; extra fields ignored)
#[derive(Deserialize)]
struct ChatCallback {
    text: String,
    name: String,
}

/// Post a message through the bot, if one is configured. Delivery
/// failures are logged, never fatal - the HTTP response still carries
/// the reply.
fn send_bot_message(bot_id: &Option<String>, message: &str) {
    let Some(bot_id) = bot_id else {
        return;
    };
    let result = ureq::post("https://api.groupme.com/v3/bots/post").send_json(serde_json::json!({
        "bot_id": bot_id,
        "text": message,
    }));
    if let Err(e) = result {
        eprintln!("Failed to send bot message: {}", e);
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST / - chat callback
async fn handle_message(
    State(state): State<AppState>,
    Json(callback): Json<ChatCallback>,
) -> impl IntoResponse {
    let intent = match parse_message(&callback.text, &callback.name, default_effective_month()) {
        ParseOutcome::NotACommand => {
            return (StatusCode::OK, "Not a rent command".to_string());
        }
        ParseOutcome::Unrecognized(verb) => {
            println!("Unrecognized command {:?} from {:?}", verb, callback.name);
            send_bot_message(&state.bot_id, UNRECOGNIZED_MESSAGE);
            return (StatusCode::BAD_REQUEST, UNRECOGNIZED_MESSAGE.to_string());
        }
        ParseOutcome::Command(intent) => intent,
    };
    println!("Received command {:?} from {:?}", intent.verb, callback.name);

    let outcome = {
        let mut engine = state.engine.lock().unwrap();
        execute(&mut engine, &intent)
    };
    match outcome {
        Ok(CommandOutcome::Reply(reply)) => {
            send_bot_message(&state.bot_id, &reply);
            (StatusCode::OK, reply)
        }
        Ok(CommandOutcome::AmountsOwed(owed)) => {
            let mut reply = format_amounts_owed(&owed);
            if let Some(note) = &state.payment_note {
                reply.push_str("\n\n");
                reply.push_str(note);
            }
            send_bot_message(&state.bot_id, &reply);
            (StatusCode::OK, reply)
        }
        Err(e) => {
            eprintln!("Command failed: {:#}", e);
            send_bot_message(&state.bot_id, SICK_MESSAGE);
            (StatusCode::INTERNAL_SERVER_ERROR, SICK_MESSAGE.to_string())
        }
    }
}

/// GET /reminder - make sure the month exists, then nag the group
async fn send_reminder(State(state): State<AppState>) -> impl IntoResponse {
    println!("Received reminder request");
    let result = {
        let mut engine = state.engine.lock().unwrap();
        engine.create_month(default_effective_month())
    };
    if let Err(e) = result {
        eprintln!("Failed to create month for reminder: {:#}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create month".to_string());
    }
    send_bot_message(&state.bot_id, REMINDER_MESSAGE);
    (StatusCode::OK, "Reminder message sent".to_string())
}

/// GET /health
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, format!("rent-ledger {}", rent_ledger::VERSION))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let sheet_path =
        env::var("RENT_LEDGER_SHEET_PATH").unwrap_or_else(|_| "rent-ledger.csv".to_string());
    let port: u16 = env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(5000);

    let mut engine = LedgerEngine::new(CsvGrid::open(&sheet_path));
    if engine.init_if_empty()? {
        println!("Initialized new ledger at {}", sheet_path);
    }

    let state = AppState {
        engine: Arc::new(Mutex::new(engine)),
        bot_id: env::var("GROUPME_BOT_ID").ok(),
        payment_note: env::var("RENT_LEDGER_PAYMENT_NOTE").ok(),
    };
    if state.bot_id.is_none() {
        println!("GROUPME_BOT_ID not set; replies go to HTTP responses only");
    }

    let app = Router::new()
        .route("/", post(handle_message))
        .route("/reminder", get(send_reminder))
        .route("/health", get(health_check))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    println!("rent-server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
