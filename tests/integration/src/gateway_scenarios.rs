//! End-to-end gateway scenarios driven through the JSON-RPC server
//!
//! Each test builds a throwaway workspace of fake repositories, starts a
//! gateway rooted there and talks to it exactly as an MCP client would.

use pretty_assertions::assert_eq;
use repo_core::{Environment, Gateway};
use repo_mcp::GatewayServer;
use repo_meta::{ConfigLoader, GatewayConfig};
use repo_test_utils::TestWorkspace;
use serde_json::{Value, json};

struct Client {
    server: GatewayServer,
    next_id: u64,
}

impl Client {
    async fn start(ws: &TestWorkspace) -> Self {
        let config = ConfigLoader::new(ws.root())
            .with_home_dir(None)
            .with_env_config(None)
            .load()
            .config;
        Self::start_with(ws, config).await
    }

    async fn start_with(ws: &TestWorkspace, config: GatewayConfig) -> Self {
        let gateway = Gateway::new(config, Environment::new(ws.root()));
        gateway.initialize().await.unwrap();
        Self {
            server: GatewayServer::new(gateway),
            next_id: 1,
        }
    }

    async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let message = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        let response = self
            .server
            .handle_message(&message.to_string())
            .await
            .unwrap()
            .unwrap();
        let response: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(response["id"], id);
        response
    }

    async fn tool_names(&mut self) -> Vec<String> {
        let response = self.request("tools/list", json!({})).await;
        response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect()
    }

    /// Call a tool, returning `(isError, parsed text body)`.
    async fn call(&mut self, name: &str, arguments: Value) -> (bool, Value) {
        let response = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        let result = &response["result"];
        let text = result["content"][0]["text"].as_str().unwrap();
        let body = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        (result["isError"] == true, body)
    }
}

fn repo_entry<'a>(repos: &'a Value, name: &str) -> Vec<&'a Value> {
    repos
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["name"] == name)
        .collect()
}

#[tokio::test]
async fn express_dependency_classifies_backend() {
    let ws = TestWorkspace::new();
    ws.node_repo("api", &["express", "lodash"]);
    ws.node_repo("web", &["react"]);
    ws.foundry_repo("token");
    let mut client = Client::start(&ws).await;

    let (is_error, repos) = client.call("list_repos", json!({})).await;
    assert!(!is_error);

    let types: Vec<(&str, &str)> = repos
        .as_array()
        .unwrap()
        .iter()
        .map(|r| (r["name"].as_str().unwrap(), r["type"].as_str().unwrap()))
        .collect();
    assert_eq!(
        types,
        vec![("api", "backend"), ("token", "contracts"), ("web", "frontend")]
    );
}

#[tokio::test]
async fn configured_repo_shadows_discovered_duplicate() {
    let ws = TestWorkspace::new();
    ws.git_repo("svc");
    ws.git_repo("pinned/svc");
    ws.file(
        ".multi-repo-mcp/repos.json",
        &json!({"repos": [{"name": "svc", "path": "pinned/svc", "type": "infrastructure"}]})
            .to_string(),
    );
    let mut client = Client::start(&ws).await;

    let (_, repos) = client.call("list_repos", json!({})).await;
    let svc = repo_entry(&repos, "svc");

    assert_eq!(svc.len(), 1);
    assert_eq!(svc[0]["type"], "infrastructure");
    assert!(svc[0]["path"].as_str().unwrap().ends_with("svc"));
    assert!(svc[0]["path"].as_str().unwrap().contains("pinned"));
}

#[tokio::test]
async fn unresolvable_tool_path_registers_fallback() {
    let ws = TestWorkspace::new();
    ws.git_repo("svc");
    ws.file("svc/notes.txt", "hello");
    ws.dir("svc/docs");
    ws.file(
        ".multi-repo-mcp/repos.json",
        r#"{"repos":[{"name":"svc","path":"svc","tools":"no/such/tools.toml"}]}"#,
    );
    let mut client = Client::start(&ws).await;

    let (is_error, listing) = client.call("svc:list_files", json!({})).await;
    assert!(!is_error, "{listing}");
    assert_eq!(
        listing,
        json!([
            {"name": ".git", "type": "directory"},
            {"name": "docs", "type": "directory"},
            {"name": "notes.txt", "type": "file"}
        ])
    );

    let svc_tools: Vec<String> = client
        .tool_names()
        .await
        .into_iter()
        .filter(|n| n.starts_with("svc:"))
        .collect();
    assert_eq!(svc_tools, vec!["svc:list_files"]);
}

#[tokio::test]
async fn unknown_repository_call_is_error_result() {
    let ws = TestWorkspace::new();
    ws.node_repo("api", &["express"]);
    let mut client = Client::start(&ws).await;

    let response = client
        .request("tools/call", json!({"name": "ghost:anything", "arguments": {}}))
        .await;
    assert!(response.get("error").is_none());

    let (is_error, body) = client.call("ghost:anything", json!({})).await;
    assert!(is_error);
    assert_eq!(body["error"], "Tool 'ghost:anything' not found");

    // the gateway keeps serving afterwards
    let (is_error, _) = client.call("list_repos", json!({})).await;
    assert!(!is_error);
}

#[tokio::test]
async fn lazy_startup_lists_only_root_tools() {
    let ws = TestWorkspace::new();
    ws.node_repo("api", &["express"]);
    ws.foundry_repo("token");
    let mut client = Client::start(&ws).await;

    assert_eq!(
        client.tool_names().await,
        vec!["get_repo_info", "list_repos", "search_across_repos"]
    );

    client.call("api:get_api_endpoint", json!({"endpoint": "/users"})).await;
    let names = client.tool_names().await;
    assert!(names.contains(&"api:get_api_endpoint".to_string()));
    assert!(!names.iter().any(|n| n.starts_with("token:")));
}

#[tokio::test]
async fn eager_startup_lists_repository_tools() {
    let ws = TestWorkspace::new();
    ws.node_repo("api", &["express"]);
    let mut config = GatewayConfig::default();
    config.tools.lazy_load = false;
    let mut client = Client::start_with(&ws, config).await;

    assert!(
        client
            .tool_names()
            .await
            .contains(&"api:get_api_endpoint".to_string())
    );
}

#[tokio::test]
async fn repo_info_reports_loaded_tools_and_tree() {
    let ws = TestWorkspace::new();
    ws.node_repo("api", &["express"]);
    ws.file("api/src/routes/users.ts", "router.get('/users', list);\n");
    let mut client = Client::start(&ws).await;

    let (_, found) = client
        .call("api:get_api_endpoint", json!({"endpoint": "/api/users"}))
        .await;
    assert_eq!(found["found"], true);

    let (is_error, info) = client.call("get_repo_info", json!({"repo": "api"})).await;
    assert!(!is_error);
    assert_eq!(info["type"], "backend");
    assert_eq!(info["tools"][0]["name"], "get_api_endpoint");
    assert_eq!(info["fileStructure"]["package.json"], "file");
    assert!(info["fileStructure"]["src"]["routes"].is_object());
}
