//! Minimal strata example — a message pipeline with validation, a
//! conditional audit epilogue, and fault interception.
//!
//! Run with:
//!   RUST_LOG=strata=trace cargo run --example pipeline

use strata::{hierarchy, AfterIf, Catch, Error, If, Meta, Stack};

#[derive(Debug, Default)]
struct Exchange {
    message: String,
    valid: bool,
    reply: Option<String>,
}

// The empty-gate branch: fail fast so the surrounding Catch can shape the
// reply instead of the caller seeing a rejection.
async fn reject_empty(_ctx: &mut Exchange) -> Result<(), Error> {
    Err(Error::msg("empty message"))
}

async fn validate(ctx: &mut Exchange) -> Result<(), Error> {
    ctx.valid = ctx.message.chars().all(|c| !c.is_control());
    Ok(())
}

async fn respond(ctx: &mut Exchange) -> Result<(), Error> {
    if ctx.valid {
        ctx.reply = Some(format!("ack: {}", ctx.message));
    }
    Ok(())
}

async fn audit(ctx: &mut Exchange) -> Result<(), Error> {
    tracing::info!(message = %ctx.message, "long message audited");
    Ok(())
}

async fn report(err: Error, ctx: &mut Exchange) -> Result<(), Error> {
    ctx.reply = Some(format!("rejected: {err}"));
    Ok(())
}

fn pipeline() -> Stack<Exchange> {
    let guarded = Stack::named("guarded")
        .with(
            If::new(|x: &Exchange| x.message.is_empty(), Stack::new().with(reject_empty))
                .short_circuit()
                .annotate(Meta::named("empty-gate")),
        )
        .with_meta(validate, Meta::named("validate"))
        .with(
            AfterIf::new(
                |x: &Exchange| x.message.len() > 5,
                Stack::new().with_meta(audit, Meta::named("audit")),
            )
            .annotate(Meta::named("audit-long")),
        )
        .with_meta(respond, Meta::named("respond"));

    Stack::named("pipeline").with(Catch::new(report, guarded).annotate(Meta::named("catch")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let app = pipeline();

    for message in ["hi", "hello world", ""] {
        let mut ctx = Exchange { message: message.into(), ..Default::default() };
        app.execute(&mut ctx).await?;
        println!("{message:?} -> {:?}", ctx.reply);
    }

    let tree = hierarchy(&app)?;
    println!("{}", serde_json::to_string_pretty(&tree).expect("tree serializes"));
    Ok(())
}
