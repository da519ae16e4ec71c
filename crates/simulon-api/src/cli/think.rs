//! `simulon think`: the terminal client shell.

use anyhow::Context;

use simulon_types::session::SessionId;
use simulon_types::think::ThinkMode;

use super::ThinkArgs;
use super::shell::client::{ClientError, ThinkClient};
use super::shell::renderer::Renderer;
use super::shell::state::ShellState;

pub async fn run(args: ThinkArgs, json: bool) -> anyhow::Result<()> {
    let session = match args.session.as_deref() {
        Some(raw) => raw
            .parse::<SessionId>()
            .map_err(anyhow::Error::msg)
            .context("invalid --session")?,
        None => SessionId::generate(),
    };

    let mut state = ShellState::with_session(session.clone());
    state.set_query(args.query.join(" "));
    let Some(seed) = state.submit() else {
        tracing::info!("blank query ignored");
        return Ok(());
    };

    let client = ThinkClient::new(args.server);
    let mut renderer = Renderer::new(json);
    renderer.start("thinking...");

    if args.mode == ThinkMode::Single {
        let outcome = client.single(&seed, &session).await;
        renderer.stop();
        state.finish();
        return match outcome {
            Ok(text) => {
                renderer.reply(&text);
                Ok(())
            }
            Err(e) => Err(e).context("single-turn request failed"),
        };
    }

    let outcome = match args.mode {
        ThinkMode::Batch => client.batch(&seed, &session).await.map(|pairs| state.replace_pairs(pairs)),
        ThinkMode::Progressive => {
            client
                .progressive(&seed, &session, |pair| {
                    renderer.pair(&pair);
                    state.push_pair(pair);
                })
                .await
        }
        _ => {
            client
                .stream(&seed, &session, |pair| {
                    renderer.pair(&pair);
                    state.push_pair(pair);
                })
                .await
        }
    };

    match outcome {
        Ok(()) => {
            state.finish();
        }
        Err(ClientError::Remote(reason)) => {
            // Pairs delivered before the failure stay on screen.
            state.finish();
            renderer.warn(&format!("the server stopped early: {reason}"));
        }
        Err(e) => {
            tracing::warn!(error = %e, "think request failed");
            state.fail();
            renderer.restart_numbering();
        }
    }

    renderer.catch_up(state.pairs());
    renderer.finish(state.pairs());
    tracing::debug!(session = %state.session_id(), pairs = state.pairs().len(), "think finished");
    Ok(())
}
