//! Integration tests for agent tools under session binding.
//!
//! Tests that concurrently running workflows each reach their own workspace
//! through the active-session binding.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use workbench_kernel::vfs::context::active_session_id;

mod common;

/// Test that parallel workflows bound to different sessions never mix files.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bound_workflows_are_isolated() -> Result<()> {
    let ctx = common::IntegrationTestContext::new()?;
    let mut handles = Vec::new();

    for i in 0..8 {
        let service = Arc::clone(&ctx.service);
        let tools = ctx.tools();
        handles.push(tokio::spawn(async move {
            let id = format!("run-{i}");
            service
                .bind(Some(id.as_str()), async {
                    for step in 0..5 {
                        tools.write_file(&format!("step-{step}.txt"), &id)?;
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                    tools.list_files(None)
                })
                .await?
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let listing = handle.await??;
        assert_eq!(
            listing,
            "step-0.txt\nstep-1.txt\nstep-2.txt\nstep-3.txt\nstep-4.txt"
        );
        let id = format!("run-{i}");
        assert_eq!(ctx.service.read_text(Some(id.as_str()), "step-3.txt")?, id);
    }
    Ok(())
}

/// Test that the binding does not outlive the bound future.
#[tokio::test]
async fn test_binding_is_scoped_to_future() -> Result<()> {
    let ctx = common::IntegrationTestContext::new()?;
    let tools = ctx.tools();

    let inside = ctx
        .service
        .bind(Some("scoped"), async { active_session_id() })
        .await?;
    assert_eq!(inside.as_deref(), Some("scoped"));
    assert_eq!(active_session_id(), None);

    assert_eq!(tools.write_file("fallback.txt", "x")?, "WROTE: fallback.txt");
    assert_eq!(
        ctx.service.list_relative_files(Some("default"), ".")?,
        ["fallback.txt"]
    );
    Ok(())
}

/// Test that a failing bound workflow still releases its binding.
#[tokio::test]
async fn test_binding_released_after_error() -> Result<()> {
    let ctx = common::IntegrationTestContext::new()?;
    let tools = ctx.tools();

    let outcome = ctx
        .service
        .bind(Some("failing"), async { tools.write_file("../escape", "x") })
        .await?;
    assert!(outcome.is_err());
    assert_eq!(active_session_id(), None);
    Ok(())
}

/// Test that an explicit session id wins over the bound one.
#[tokio::test]
async fn test_explicit_id_overrides_binding() -> Result<()> {
    let ctx = common::IntegrationTestContext::new()?;
    let service = Arc::clone(&ctx.service);

    ctx.service
        .bind(Some("bound"), async {
            service.write_text(Some("explicit"), "x.txt", "x")?;
            service.write_text(None, "y.txt", "y")
        })
        .await??;

    assert_eq!(ctx.service.list_relative_files(Some("explicit"), ".")?, ["x.txt"]);
    assert_eq!(ctx.service.list_relative_files(Some("bound"), ".")?, ["y.txt"]);
    Ok(())
}

/// Test the JSON dispatch used by agent runtimes.
#[tokio::test]
async fn test_tool_dispatch_inside_binding() -> Result<()> {
    let ctx = common::IntegrationTestContext::new()?;
    let tools = ctx.tools();

    let output = ctx
        .service
        .bind(Some("json"), async {
            tools.execute(
                "write_file",
                &serde_json::json!({"path": "index.html", "content": "<p>hi</p>"}),
            )?;
            tools.execute("read_file", &serde_json::json!({"path": "index.html"}))
        })
        .await??;
    assert_eq!(output, "<p>hi</p>");
    Ok(())
}
