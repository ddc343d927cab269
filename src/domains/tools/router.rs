//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! Used by the STDIO/TCP transports. Every registered tool gets one dynamic
//! route that invokes it with the call arguments.

use futures::FutureExt;
use rmcp::handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter};

use super::registry::{ToolRegistry, params_from, run_tool};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(registry: &ToolRegistry) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    registry
        .tools()
        .iter()
        .cloned()
        .fold(ToolRouter::new(), |router, tool| {
            router.with_route(ToolRoute::new_dyn(
                tool.to_tool(),
                move |ctx: ToolCallContext<'_, S>| {
                    let tool = tool.clone();
                    let params = params_from(ctx.arguments.clone());
                    async move { Ok(run_tool(tool.as_ref(), &params).await) }.boxed()
                },
            ))
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::config::Config;
    use crate::core::http::testing::{ScriptedTransport, client};
    use crate::domains::fixtures::DataLoader;
    use serde_json::json;

    struct TestServer {}

    fn registries() -> Vec<ToolRegistry> {
        let config = Config::default();
        vec![
            ToolRegistry::public_api(&config, client(ScriptedTransport::json(json!({})))),
            ToolRegistry::monitoring(&config, Arc::new(DataLoader::new("data"))),
        ]
    }

    #[test]
    fn test_build_router() {
        let config = Config::default();
        let registry = ToolRegistry::public_api(&config, client(ScriptedTransport::json(json!({}))));
        let router: ToolRouter<TestServer> = build_tool_router(&registry);
        let tools = router.list_all();
        assert_eq!(tools.len(), 4);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"get_weather"));
        assert!(names.contains(&"get_ip_info"));
        assert!(names.contains(&"lookup_word"));
        assert!(names.contains(&"get_exchange_rate"));
    }

    #[test]
    fn test_registry_matches_router() {
        for registry in registries() {
            let registry_names = registry.tool_names();

            let router: ToolRouter<TestServer> = build_tool_router(&registry);
            let router_tools = router.list_all();
            let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

            assert_eq!(registry_names.len(), router_names.len());
            for name in registry_names {
                assert!(router_names.contains(&name));
            }
        }
    }

    #[test]
    fn test_router_schemas_are_objects() {
        for registry in registries() {
            let router: ToolRouter<TestServer> = build_tool_router(&registry);
            for tool in router.list_all() {
                assert_eq!(
                    tool.input_schema.get("type").and_then(|t| t.as_str()),
                    Some("object"),
                    "{}",
                    tool.name
                );
            }
        }
    }
}
