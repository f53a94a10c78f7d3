// SDB - SQL Script Debugger
// Copyright (C) 2026 The SDB Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! End-to-end protocol tests: a real client against a live adapter.
//!
//! Each test spins up an adapter on an ephemeral port, connects over a real
//! WebSocket, and drives the documented command flow.

use sdb_client::ClientError;
use sdb_common::types::{
    SourceBreakpoint, LOCALS_REFERENCE, QUERY_REFERENCE, ROW_REFERENCE_BASE,
};
use sdb_integration_tests::test_utils::{
    connect_client, event_channel, next_event, start_strict_adapter, start_test_adapter,
};
use serde_json::json;
use tracing::info;

#[tokio::test]
async fn test_full_session_walkthrough() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");

    let mut initialized = event_channel(&client, "initialized");
    let mut stopped = event_channel(&client, "stopped");
    let mut exited = event_channel(&client, "exited");
    let mut terminated = event_channel(&client, "terminated");

    // initialize: capability negotiation
    let caps = client.initialize("walkthrough").await.expect("initialize");
    assert!(caps.supports_configuration_done_request);
    assert!(caps.supports_conditional_breakpoints);

    // breakpoints at 5, 10, 20 - all verified
    let verified = client
        .set_breakpoints(
            "/query.sql",
            &[
                SourceBreakpoint::at(5),
                SourceBreakpoint::at(10),
                SourceBreakpoint::at(20),
            ],
        )
        .await
        .expect("setBreakpoints");
    assert_eq!(verified.len(), 3);
    assert!(verified.iter().all(|bp| bp.verified));

    // launch emits `initialized`
    client.launch("/query.sql", Some(50)).await.expect("launch");
    next_event(&mut initialized).await;

    // configurationDone schedules the entry stop at the lowest breakpoint
    client.configuration_done().await.expect("configurationDone");
    let entry = next_event(&mut stopped).await;
    let body = entry.body.expect("stopped body");
    assert_eq!(body["reason"], json!("entry"));
    assert_eq!(body["line"], json!(5));
    info!("entry stop at line 5");

    // paused state is observable: stack, scopes, variables, evaluate
    let frames = client.stack_trace().await.expect("stackTrace");
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].line, 5);
    assert_eq!(frames[0].name, "executeSQL");

    let threads = client.threads().await.expect("threads");
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].name, "SQL Thread");

    let scopes = client.scopes().await.expect("scopes");
    assert_eq!(scopes.len(), 2);
    assert_eq!(scopes[0].variables_reference, LOCALS_REFERENCE);
    assert_eq!(scopes[1].variables_reference, QUERY_REFERENCE);

    let locals = client.variables(LOCALS_REFERENCE).await.expect("locals");
    assert!(locals.iter().any(|v| v.name == "query"));
    assert!(locals.iter().all(|v| v.variables_reference == 0));

    let rows = client.variables(QUERY_REFERENCE).await.expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].variables_reference, ROW_REFERENCE_BASE);

    let columns = client.variables(ROW_REFERENCE_BASE).await.expect("row columns");
    let names: Vec<&str> = columns.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name"]);

    assert_eq!(client.evaluate("rowcount").await.expect("evaluate"), "2");
    assert_eq!(client.evaluate("current").await.expect("evaluate"), "5");
    assert_eq!(
        client.evaluate("nonsense").await.expect("evaluate"),
        "Evaluated: nonsense"
    );

    // continue walks the remaining breakpoints in order
    client.continue_().await.expect("continue");
    let hit = next_event(&mut stopped).await;
    let body = hit.body.expect("stopped body");
    assert_eq!(body["reason"], json!("breakpoint"));
    assert_eq!(body["line"], json!(10));

    client.continue_().await.expect("continue");
    let body = next_event(&mut stopped).await.body.expect("stopped body");
    assert_eq!(body["line"], json!(20));

    // no breakpoint ahead: ran to completion
    client.continue_().await.expect("continue");
    let exit = next_event(&mut exited).await;
    assert_eq!(exit.body.expect("exited body")["exitCode"], json!(0));
    next_event(&mut terminated).await;

    // terminated is absorbing: re-entering continue fails fast
    let err = client.continue_().await.expect_err("continue after terminate");
    match err {
        ClientError::Remote(message) => assert!(message.contains("terminated")),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_step_advances_one_line_and_never_skips_to_breakpoints() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");
    let mut stopped = event_channel(&client, "stopped");

    client.initialize("stepper").await.expect("initialize");
    client
        .set_breakpoints("/query.sql", &[SourceBreakpoint::at(7), SourceBreakpoint::at(100)])
        .await
        .expect("setBreakpoints");
    client.launch("/query.sql", Some(200)).await.expect("launch");
    client.configuration_done().await.expect("configurationDone");

    let body = next_event(&mut stopped).await.body.expect("entry body");
    assert_eq!(body["line"], json!(7));

    // a step from 7 lands on 8 - the breakpoint at 100 plays no part
    for (command, expected) in [("next", 8), ("stepIn", 9), ("stepOut", 10)] {
        match command {
            "next" => client.next().await.expect("next"),
            "stepIn" => client.step_in().await.expect("stepIn"),
            _ => client.step_out().await.expect("stepOut"),
        }
        let body = next_event(&mut stopped).await.body.expect("stopped body");
        assert_eq!(body["reason"], json!("step"), "{command} stops with reason step");
        assert_eq!(body["line"], json!(expected));
    }

    // stepping refreshed the simulated result rows
    assert_eq!(client.evaluate("rowcount").await.expect("evaluate"), "3");
}

#[tokio::test]
async fn test_duplicate_breakpoint_lines_collapse() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");

    client.initialize("dedup").await.expect("initialize");
    let verified = client
        .set_breakpoints(
            "/query.sql",
            &[
                SourceBreakpoint::at(3),
                SourceBreakpoint::at(3),
                SourceBreakpoint::at(7),
            ],
        )
        .await
        .expect("setBreakpoints");

    let lines: Vec<u32> = verified.iter().map(|bp| bp.line).collect();
    assert_eq!(lines, vec![3, 7]);
    assert!(verified.iter().all(|bp| bp.verified));
}

#[tokio::test]
async fn test_conditional_breakpoint_is_skipped_deterministically() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");
    let mut stopped = event_channel(&client, "stopped");

    client.initialize("conditions").await.expect("initialize");
    client
        .set_breakpoints(
            "/query.sql",
            &[
                SourceBreakpoint::at(5),
                // the entry stop binds rows=2, so this can never hold
                SourceBreakpoint::at(10).with_condition("rows > 99"),
                SourceBreakpoint::at(20),
            ],
        )
        .await
        .expect("setBreakpoints");
    client.launch("/query.sql", None).await.expect("launch");
    client.configuration_done().await.expect("configurationDone");
    next_event(&mut stopped).await;

    // line 10's condition fails, so continue sails through to 20
    client.continue_().await.expect("continue");
    let body = next_event(&mut stopped).await.body.expect("stopped body");
    assert_eq!(body["line"], json!(20));
}

#[tokio::test]
async fn test_correlation_under_interleaved_events() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");
    let mut stopped = event_channel(&client, "stopped");

    client.initialize("interleave").await.expect("initialize");
    client.launch("/query.sql", None).await.expect("launch");
    client.configuration_done().await.expect("configurationDone");
    next_event(&mut stopped).await;

    // fire concurrent requests while a pause interleaves a stopped event
    // into the same stream of response frames
    let (pause, query, threads, echo) = tokio::join!(
        client.pause(),
        client.evaluate("query"),
        client.threads(),
        client.evaluate("nonsense"),
    );
    pause.expect("pause");
    assert_eq!(query.expect("evaluate query"), "SELECT * FROM users");
    assert_eq!(threads.expect("threads").len(), 1);
    assert_eq!(echo.expect("evaluate echo"), "Evaluated: nonsense");

    // the pause's stopped event arrived as well
    let body = next_event(&mut stopped).await.body.expect("stopped body");
    assert_eq!(body["reason"], json!("pause"));
}

#[tokio::test]
async fn test_event_sequence_numbers_strictly_increase() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");
    let mut stopped = event_channel(&client, "stopped");

    client.initialize("seqs").await.expect("initialize");
    client.launch("/query.sql", Some(50)).await.expect("launch");
    client.configuration_done().await.expect("configurationDone");

    let mut seqs = vec![next_event(&mut stopped).await.seq];
    for _ in 0..4 {
        client.next().await.expect("next");
        seqs.push(next_event(&mut stopped).await.seq);
    }
    assert!(
        seqs.windows(2).all(|pair| pair[0] < pair[1]),
        "event seqs must strictly increase, got {seqs:?}"
    );
}

#[tokio::test]
async fn test_stale_variables_reference_resolves_to_empty() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");
    let mut stopped = event_channel(&client, "stopped");

    client.initialize("stale").await.expect("initialize");
    client.launch("/query.sql", Some(50)).await.expect("launch");
    client.configuration_done().await.expect("configurationDone");
    next_event(&mut stopped).await;

    client.scopes().await.expect("scopes");
    assert!(!client.variables(LOCALS_REFERENCE).await.expect("variables").is_empty());

    // a new stop invalidates every reference handed out before it
    client.next().await.expect("next");
    next_event(&mut stopped).await;

    let stale = client.variables(LOCALS_REFERENCE).await.expect("stale variables");
    assert!(stale.is_empty(), "stale reference must resolve to empty, not crash");

    // fetching scopes again revalidates the reference for the new pause
    client.scopes().await.expect("scopes");
    assert!(!client.variables(LOCALS_REFERENCE).await.expect("variables").is_empty());
}

#[tokio::test]
async fn test_pause_stops_in_place() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");
    let mut stopped = event_channel(&client, "stopped");

    client.initialize("pause").await.expect("initialize");
    client.launch("/query.sql", None).await.expect("launch");

    client.pause().await.expect("pause");
    let body = next_event(&mut stopped).await.body.expect("stopped body");
    assert_eq!(body["reason"], json!("pause"));
    assert_eq!(body["line"], json!(1));
}

#[tokio::test]
async fn test_restart_returns_to_configuration() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");
    let mut initialized = event_channel(&client, "initialized");
    let mut stopped = event_channel(&client, "stopped");

    client.initialize("restart").await.expect("initialize");
    client
        .set_breakpoints("/query.sql", &[SourceBreakpoint::at(4)])
        .await
        .expect("setBreakpoints");
    client.launch("/query.sql", None).await.expect("launch");
    next_event(&mut initialized).await;
    client.configuration_done().await.expect("configurationDone");
    let body = next_event(&mut stopped).await.body.expect("entry body");
    assert_eq!(body["line"], json!(4));

    // restart re-runs the configuration sequence with breakpoints intact
    client.restart().await.expect("restart");
    next_event(&mut initialized).await;
    client.configuration_done().await.expect("configurationDone");
    let body = next_event(&mut stopped).await.body.expect("entry body");
    assert_eq!(body["line"], json!(4));
}

#[tokio::test]
async fn test_unrecognized_commands_lenient_and_strict() {
    let lenient = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&lenient).await.expect("client should connect");
    let response =
        client.send_request("fooBar", None).await.expect("lenient adapter acks unknowns");
    assert!(response.success);

    let strict = start_strict_adapter().await.expect("strict adapter should start");
    let client = connect_client(&strict).await.expect("client should connect");
    let err = client.send_request("fooBar", None).await.expect_err("strict adapter rejects");
    match err {
        ClientError::Remote(message) => assert!(message.contains("fooBar")),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_exception_breakpoints_are_acknowledged() {
    let adapter = start_test_adapter().await.expect("adapter should start");
    let client = connect_client(&adapter).await.expect("client should connect");

    client.initialize("filters").await.expect("initialize");
    client.set_exception_breakpoints(&["all"]).await.expect("setExceptionBreakpoints");
}
