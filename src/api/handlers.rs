use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::transaction::REWARD_SENDER;
use crate::ledger::{consensus, pow, Block, Transaction};
use crate::node::Node;

/// Data structure for the node state
pub type NodeData = web::Data<Node>;

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The blocks in the chain
    pub chain: Vec<Block>,

    /// The length of the chain
    pub length: usize,
}

/// Request for the transaction endpoint
///
/// All fields are required; they are optional here only so the handler can
/// report missing data instead of failing deserialization.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The sender's address
    pub sender: Option<String>,

    /// The recipient's address
    pub recipient: Option<String>,

    /// The amount to transfer
    pub amount: Option<f64>,
}

/// Response carrying only a message
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// The message
    pub message: String,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// The index of the newly sealed block
    pub index: u64,

    /// The transactions sealed into the block
    pub transactions: Vec<Transaction>,

    /// The proof of work for the block
    pub proof: u64,

    /// The digest of the preceding block
    pub previous_hash: String,
}

/// Request for the node registration endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Peer addresses to register
    pub nodes: Option<Vec<String>>,
}

/// Response for the node registration endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    /// The message
    pub message: String,

    /// All registered peers
    pub total_nodes: Vec<String>,
}

/// Mine a new block
///
/// Solves the proof-of-work puzzle for the last block, rewards this node
/// with one coin and seals the pending transactions into a new block
#[utoipa::path(
    get,
    path = "/mine",
    responses(
        (status = 200, description = "New block sealed", body = MineResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn mine(node: NodeData) -> impl Responder {
    let last_block = match node.ledger.last_block() {
        Ok(block) => block,
        Err(err) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to read chain: {}", err)
            }));
        }
    };

    // The proof search is CPU-bound with unbounded latency; run it on the
    // blocking pool so it never stalls a request worker, and without
    // holding the ledger lock.
    let last_proof = last_block.proof;
    let proof = match web::block(move || pow::solve(last_proof)).await {
        Ok(proof) => proof,
        Err(err) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Proof search was cancelled: {}", err)
            }));
        }
    };

    // Reward for finding the proof; sender "0" marks a minted coin
    node.ledger
        .new_transaction(REWARD_SENDER, node.id.clone(), 1.0);

    let block = node.ledger.new_block(proof, Some(last_block.digest()));

    HttpResponse::Ok().json(MineResponse {
        message: "New Block Created".to_string(),
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    })
}

/// Create a new transaction
///
/// Adds a transaction to the pending pool
#[utoipa::path(
    post,
    path = "/transactions/new",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction accepted", body = MessageResponse),
        (status = 400, description = "Missing data")
    )
)]
pub async fn new_transaction(
    node: NodeData,
    request: web::Json<TransactionRequest>,
) -> impl Responder {
    let request = request.into_inner();

    let (sender, recipient, amount) = match (request.sender, request.recipient, request.amount) {
        (Some(sender), Some(recipient), Some(amount)) => (sender, recipient, amount),
        _ => return HttpResponse::BadRequest().body("Missing data"),
    };

    let index = node.ledger.new_transaction(sender, recipient, amount);

    HttpResponse::Created().json(MessageResponse {
        message: format!("Transaction will be added to Block {}", index),
    })
}

/// Get the full chain
///
/// Returns every block plus the chain length, the same payload peers pull
/// during consensus resolution
#[utoipa::path(
    get,
    path = "/chain",
    responses(
        (status = 200, description = "Chain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn get_chain(node: NodeData) -> impl Responder {
    let chain = node.ledger.chain();

    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        chain,
    })
}

/// Register peer nodes
///
/// Adds each address in the request to the peer set
#[utoipa::path(
    post,
    path = "/nodes/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Nodes registered", body = RegisterResponse),
        (status = 400, description = "Missing or invalid node list")
    )
)]
pub async fn register_nodes(
    node: NodeData,
    request: web::Json<RegisterRequest>,
) -> impl Responder {
    let addresses = match request.into_inner().nodes {
        Some(addresses) => addresses,
        None => {
            return HttpResponse::BadRequest().body("Error: Please supply a valid list of nodes");
        }
    };

    for address in &addresses {
        if let Err(err) = node.peers.register(address) {
            return HttpResponse::BadRequest().body(err.to_string());
        }
    }

    HttpResponse::Created().json(RegisterResponse {
        message: "New nodes have been added".to_string(),
        total_nodes: node.peers.peers(),
    })
}

/// Resolve conflicts with the registered peers
///
/// Applies the longest-valid-chain rule against every registered peer and
/// reports whether the local chain was replaced
#[utoipa::path(
    get,
    path = "/nodes/resolve",
    responses(
        (status = 200, description = "Resolution outcome with the authoritative chain")
    )
)]
pub async fn resolve_conflicts(node: NodeData) -> impl Responder {
    let replaced = consensus::resolve(&node.ledger, &node.peers, &node.http).await;

    if replaced {
        HttpResponse::Ok().json(serde_json::json!({
            "message": "Our chain was replaced",
            "new_chain": node.ledger.chain(),
        }))
    } else {
        HttpResponse::Ok().json(serde_json::json!({
            "message": "Our chain is authoritative",
            "chain": node.ledger.chain(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    macro_rules! test_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Node::new()))
                    .configure(crate::api::configure_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_get_chain_returns_genesis() {
        let app = test_app!();

        let req = test::TestRequest::get().uri("/chain").to_request();
        let resp: ChainResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.length, 1);
        assert_eq!(resp.chain.len(), 1);
        assert_eq!(resp.chain[0].index, 1);
    }

    #[actix_web::test]
    async fn test_new_transaction_accepted() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/transactions/new")
            .set_json(serde_json::json!({
                "sender": "alice",
                "recipient": "bob",
                "amount": 5.0,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Transaction will be added to Block 2");
    }

    #[actix_web::test]
    async fn test_new_transaction_missing_field_rejected() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/transactions/new")
            .set_json(serde_json::json!({
                "sender": "alice",
                "amount": 5.0,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(test::read_body(resp).await, "Missing data");
    }

    #[actix_web::test]
    async fn test_mine_seals_pending_transactions_and_reward() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/transactions/new")
            .set_json(serde_json::json!({
                "sender": "alice",
                "recipient": "bob",
                "amount": 5.0,
            }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/mine").to_request();
        let mined: MineResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(mined.message, "New Block Created");
        assert_eq!(mined.index, 2);
        assert_eq!(mined.transactions.len(), 2);
        assert_eq!(mined.transactions[0].sender, "alice");
        assert!(mined.transactions[1].is_reward());

        let req = test::TestRequest::get().uri("/chain").to_request();
        let resp: ChainResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.length, 2);
    }

    #[actix_web::test]
    async fn test_register_nodes() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/nodes/register")
            .set_json(serde_json::json!({
                "nodes": ["http://192.168.0.5:5000"],
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: RegisterResponse = test::read_body_json(resp).await;
        assert_eq!(body.total_nodes, vec!["192.168.0.5:5000".to_string()]);
    }

    #[actix_web::test]
    async fn test_register_nodes_missing_list_rejected() {
        let app = test_app!();

        let req = test::TestRequest::post()
            .uri("/nodes/register")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_resolve_without_peers_keeps_chain() {
        let app = test_app!();

        let req = test::TestRequest::get().uri("/nodes/resolve").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["message"], "Our chain is authoritative");
        assert_eq!(resp["chain"].as_array().unwrap().len(), 1);
    }
}
