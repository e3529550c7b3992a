//! Combinator behavior: conditional branches, epilogues, and fault
//! interception.

use strata::{After, AfterIf, Catch, Error, If, Stack};

#[derive(Default)]
struct Ctx {
    msg: String,
    valid: bool,
    printed: Vec<String>,
}

async fn mark_branch(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.printed.push("branch".into());
    Ok(())
}

async fn sentinel(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.printed.push("sentinel".into());
    Ok(())
}

async fn boom(_ctx: &mut Ctx) -> Result<(), Error> {
    Err(Error::msg("boom"))
}

// ── If ────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn branch_taken_with_short_circuit_skips_the_outer_chain() {
    let app = Stack::new()
        .with(If::new(|c: &Ctx| !c.msg.is_empty(), Stack::new().with(mark_branch)).short_circuit())
        .with(sentinel);

    let mut ctx = Ctx { msg: "hi".into(), ..Default::default() };
    app.execute(&mut ctx).await.unwrap();

    assert_eq!(ctx.printed, ["branch"]);
}

#[tokio::test]
async fn branch_taken_without_short_circuit_resumes_the_outer_chain() {
    let app = Stack::new()
        .with(If::new(|c: &Ctx| !c.msg.is_empty(), Stack::new().with(mark_branch)))
        .with(sentinel);

    let mut ctx = Ctx { msg: "hi".into(), ..Default::default() };
    app.execute(&mut ctx).await.unwrap();

    assert_eq!(ctx.printed, ["branch", "sentinel"]);
}

#[tokio::test]
async fn branch_not_taken_skips_the_inner_sequence() {
    let app = Stack::new()
        .with(If::new(|c: &Ctx| !c.msg.is_empty(), Stack::new().with(mark_branch)).short_circuit())
        .with(sentinel);

    let mut ctx = Ctx::default();
    app.execute(&mut ctx).await.unwrap();

    assert_eq!(ctx.printed, ["sentinel"]);
}

// ── After / AfterIf ───────────────────────────────────────────────────────────

#[tokio::test]
async fn after_runs_its_epilogue_strictly_after_the_outer_chain() {
    async fn epilogue(ctx: &mut Ctx) -> Result<(), Error> {
        ctx.printed.push("epilogue".into());
        Ok(())
    }

    let app = Stack::new()
        .with(After::new(Stack::new().with(epilogue)))
        .with(sentinel);

    let mut ctx = Ctx::default();
    app.execute(&mut ctx).await.unwrap();

    assert_eq!(ctx.printed, ["sentinel", "epilogue"]);
}

#[tokio::test]
async fn after_skips_its_epilogue_when_the_outer_chain_faults() {
    async fn epilogue(ctx: &mut Ctx) -> Result<(), Error> {
        ctx.printed.push("epilogue".into());
        Ok(())
    }

    let app = Stack::new()
        .with(After::new(Stack::new().with(epilogue)))
        .with(boom);

    let mut ctx = Ctx::default();
    let err = app.execute(&mut ctx).await.unwrap_err();

    assert_eq!(err.to_string(), "middleware fault: boom");
    assert!(ctx.printed.is_empty());
}

async fn validate(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.valid = !ctx.msg.is_empty();
    ctx.printed.push("validated".into());
    Ok(())
}

async fn log_msg(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.printed.push(ctx.msg.clone());
    Ok(())
}

fn logging_app() -> Stack<Ctx> {
    Stack::new()
        .with(AfterIf::new(|c: &Ctx| c.msg.len() > 5, Stack::new().with(log_msg)))
        .with(validate)
}

#[tokio::test]
async fn short_message_only_validates() {
    let mut ctx = Ctx { msg: "hello".into(), ..Default::default() };
    logging_app().execute(&mut ctx).await.unwrap();

    assert!(ctx.valid);
    assert_eq!(ctx.printed, ["validated"]);
}

#[tokio::test]
async fn long_message_validates_then_logs() {
    let mut ctx = Ctx { msg: "hello world".into(), ..Default::default() };
    logging_app().execute(&mut ctx).await.unwrap();

    assert_eq!(ctx.printed, ["validated", "hello world"]);
}

// ── Catch ─────────────────────────────────────────────────────────────────────

async fn recover(err: Error, ctx: &mut Ctx) -> Result<(), Error> {
    ctx.printed.push(format!("recovered: {err}"));
    Ok(())
}

#[tokio::test]
async fn catch_invokes_its_handler_exactly_once_and_resolves() {
    let app = Stack::new().with(Catch::new(recover, Stack::new().with(boom)));

    let mut ctx = Ctx::default();
    app.execute(&mut ctx).await.unwrap();

    assert_eq!(ctx.printed, ["recovered: middleware fault: boom"]);
}

#[tokio::test]
async fn catch_is_transparent_when_the_guarded_chain_succeeds() {
    let app = Stack::new()
        .with(Catch::new(recover, Stack::new().with(mark_branch)))
        .with(sentinel);

    let mut ctx = Ctx::default();
    app.execute(&mut ctx).await.unwrap();

    // The guarded chain resumed the outer continuation, and the handler
    // never fired.
    assert_eq!(ctx.printed, ["branch", "sentinel"]);
}

#[tokio::test]
async fn catch_covers_the_remainder_its_subtree_resumed() {
    let app = Stack::new()
        .with(Catch::new(recover, Stack::new().with(mark_branch)))
        .with(boom);

    let mut ctx = Ctx::default();
    app.execute(&mut ctx).await.unwrap();

    assert_eq!(ctx.printed, ["branch", "recovered: middleware fault: boom"]);
}

#[tokio::test]
async fn catch_can_re_raise() {
    async fn rethrow(err: Error, _ctx: &mut Ctx) -> Result<(), Error> {
        Err(err)
    }

    let app = Stack::new().with(Catch::new(rethrow, Stack::new().with(boom)));

    let mut ctx = Ctx::default();
    let err = app.execute(&mut ctx).await.unwrap_err();

    assert_eq!(err.to_string(), "middleware fault: boom");
}
