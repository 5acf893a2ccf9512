use reqwest::Client;
use serde_json::json;

/// Signs in with a Google ID token (first argument), asks one question, saves
/// the exchange to history and logs out.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let id_token = std::env::args()
        .nth(1)
        .ok_or("usage: client <google-id-token> [query]")?;
    let query = std::env::args()
        .nth(2)
        .unwrap_or_else(|| "What does Talem help students with?".to_string());

    let client = Client::builder().cookie_store(true).build()?;
    let base_url = std::env::var("TALEM_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());

    println!("Login:");
    let login_response = client
        .post(format!("{}/login/", base_url))
        .json(&json!({ "token": id_token }))
        .send()
        .await?;
    println!("Status: {}", login_response.status());
    let login_json: serde_json::Value = login_response.json().await?;
    println!("Response: {}", serde_json::to_string_pretty(&login_json)?);

    println!("\nChat:");
    let chat_response = client
        .post(format!("{}/chat/", base_url))
        .json(&json!({ "query": query }))
        .send()
        .await?;
    println!("Status: {}", chat_response.status());
    let chat_json: serde_json::Value = chat_response.json().await?;
    println!("Response: {}", serde_json::to_string_pretty(&chat_json)?);

    if let Some(answer) = chat_json["response"].as_str() {
        let saved: serde_json::Value = client
            .post(format!("{}/chat-history/", base_url))
            .json(&json!({
                "messages": [
                    { "role": "user", "content": query },
                    { "role": "assistant", "content": answer }
                ]
            }))
            .send()
            .await?
            .json()
            .await?;
        println!("\nSaved: {}", serde_json::to_string_pretty(&saved)?);
    }

    let history: serde_json::Value = client
        .get(format!("{}/chat-history/", base_url))
        .send()
        .await?
        .json()
        .await?;
    println!("\nHistory: {}", serde_json::to_string_pretty(&history)?);

    let logout_response = client.post(format!("{}/logout/", base_url)).send().await?;
    println!("\nLogout status: {}", logout_response.status());

    Ok(())
}
