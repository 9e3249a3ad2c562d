//! Smart-contract tools: ABI and deployed address lookup

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::read_json;
use crate::error::{LoadError, ToolError};
use crate::loader::ToolProvider;
use crate::tool::{
    InvocationContext, ToolDefinition, ToolHandler, ToolResult, optional_str, required_str,
};

/// Tool set for `contracts` repositories
#[derive(Debug, Default, Clone, Copy)]
pub struct ContractTools;

#[async_trait]
impl ToolProvider for ContractTools {
    async fn load_tools(&self, _repo_path: &Path) -> Result<Vec<ToolDefinition>, LoadError> {
        Ok(vec![
            ToolDefinition::new(
                "get_contract_abi",
                "Get the ABI for a specific contract",
                GetContractAbi,
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "contractName": {
                        "type": "string",
                        "description": "Name of the contract (e.g., MyContract)"
                    }
                },
                "required": ["contractName"]
            })),
            ToolDefinition::new(
                "get_contract_address",
                "Get the deployed address for a contract from deployment artifacts",
                GetContractAddress,
            )
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "contractName": {
                        "type": "string",
                        "description": "Name of the contract"
                    },
                    "network": {
                        "type": "string",
                        "description": "Network name (e.g., mainnet, sepolia)"
                    }
                },
                "required": ["contractName"]
            })),
        ])
    }
}

/// Artifact locations, Hardhat then Foundry then Truffle
fn abi_candidates(repo: &Path, contract: &str) -> [PathBuf; 3] {
    let sol = format!("{contract}.sol");
    let json = format!("{contract}.json");
    [
        repo.join("artifacts").join("contracts").join(&sol).join(&json),
        repo.join("out").join(&sol).join(&json),
        repo.join("build").join("contracts").join(&json),
    ]
}

struct GetContractAbi;

#[async_trait]
impl ToolHandler for GetContractAbi {
    async fn call(&self, args: Value, ctx: &InvocationContext) -> Result<ToolResult, ToolError> {
        let contract = required_str(&args, "contractName")?;

        for path in abi_candidates(&ctx.repo_path, contract) {
            if let Some(abi) = read_json(&path).await.and_then(|a| a.get("abi").cloned()) {
                ctx.logger.debug(&format!("ABI found at {}", path.display()));
                return Ok(ToolResult::json(&json!({ "abi": abi })));
            }
        }

        Ok(ToolResult::error_json(format!(
            "ABI not found for contract {contract}"
        )))
    }
}

struct GetContractAddress;

#[async_trait]
impl ToolHandler for GetContractAddress {
    async fn call(&self, args: Value, ctx: &InvocationContext) -> Result<ToolResult, ToolError> {
        let contract = required_str(&args, "contractName")?;
        let network = optional_str(&args, "network")?;
        let repo = &ctx.repo_path;

        // hardhat-deploy
        let net = network.unwrap_or("localhost");
        let deployment = repo.join("deployments").join(net).join(format!("{contract}.json"));
        if let Some(address) = read_json(&deployment).await.and_then(|d| address_of(&d)) {
            return Ok(found(address, net));
        }

        // OpenZeppelin upgrades manifests
        if let Some(address) = openzeppelin_address(&repo.join(".openzeppelin"), contract).await {
            return Ok(found(address, network.unwrap_or("unknown")));
        }

        // Foundry broadcast logs
        let broadcast = repo
            .join("broadcast")
            .join(contract)
            .join(net)
            .join("run-latest.json");
        if let Some(address) = read_json(&broadcast).await.and_then(|d| address_of(&d)) {
            return Ok(found(address, net));
        }

        let suffix = network.map(|n| format!(" on {n}")).unwrap_or_default();
        Ok(ToolResult::error_json(format!(
            "Address not found for contract {contract}{suffix}"
        )))
    }
}

fn found(address: String, network: &str) -> ToolResult {
    ToolResult::json(&json!({ "address": address, "network": network }))
}

/// `address`, or the first proxy's address.
fn address_of(doc: &Value) -> Option<String> {
    doc.get("address")
        .or_else(|| doc.pointer("/proxies/0/address"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// First file in `dir` (sorted) whose name mentions `contract` and that
/// holds an address.
async fn openzeppelin_address(dir: &Path, contract: &str) -> Option<String> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.contains(contract) {
            names.push(name);
        }
    }
    names.sort();

    let first = names.into_iter().next()?;
    read_json(&dir.join(first)).await.and_then(|d| address_of(&d))
}
