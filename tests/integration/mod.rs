/// Integration test entry point

mod basic_integration;
mod mcp_workflow;
