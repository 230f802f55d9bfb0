use anyhow::Result;
use std::marker::PhantomData;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

/// Minimal actor trait. Messages are handled one at a time, in arrival order.
#[async_trait::async_trait]
pub trait Actor: Send + Sized + 'static {
    type Msg: Send + 'static;

    /// Handle a single message. Return `Err` to stop the actor.
    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()>;
}

/// Runtime context for an actor instance.
///
/// It holds no address of its own, so an actor whose external addresses are
/// all dropped shuts down.
pub struct Context<A: Actor> {
    stop: bool,
    _actor: PhantomData<fn() -> A>,
}

impl<A: Actor> Context<A> {
    /// Request a graceful stop after processing the current message.
    pub fn stop(&mut self) {
        self.stop = true;
    }
}

/// Address for sending messages to an actor.
pub struct Addr<A: Actor>(mpsc::Sender<A::Msg>);

/// Manual Clone to avoid unnecessary bounds on `A`/`A::Msg`.
impl<A: Actor> Clone for Addr<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Actor> Addr<A> {
    /// Async send; awaits backpressure. Returns the message if the actor is gone.
    pub async fn send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.send(msg).await.map_err(|e| e.0)
    }

    /// Whether the actor task has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    /// Bounded mailbox capacity.
    pub fn capacity(&self) -> usize {
        self.0.max_capacity()
    }
}

/// Handle to a running actor task.
pub struct ActorHandle<A: Actor> {
    pub addr: Addr<A>,
    pub task: JoinHandle<Result<()>>,
}

/// Spawn an actor with a bounded mailbox.
///
/// The actor stops when `handle` returns `Err`, when every `Addr` is dropped,
/// or when it calls `ctx.stop()`.
///
/// ```
/// # use anyhow::Result;
/// # use async_trait::async_trait;
/// use textease_actors::actor::{self, Actor, Context};
///
/// struct WordCounter(usize);
///
/// #[async_trait]
/// impl Actor for WordCounter {
///     type Msg = String;
///     async fn handle(&mut self, msg: String, ctx: &mut Context<Self>) -> Result<()> {
///         self.0 += msg.split_whitespace().count();
///         if self.0 >= 5 {
///             ctx.stop();
///         }
///         Ok(())
///     }
/// }
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let actor::ActorHandle { addr, task } = actor::spawn_actor(WordCounter(0), 4);
///     assert_eq!(addr.capacity(), 4);
///     addr.send("раз два три".to_string()).await.unwrap();
///     addr.send("четыре пять".to_string()).await.unwrap();
///     task.await.unwrap().unwrap();
///     assert!(addr.is_closed());
/// });
/// ```
pub fn spawn_actor<A: Actor>(actor: A, capacity: usize) -> ActorHandle<A> {
    spawn_actor_with_shutdown(actor, capacity, None)
}

/// Like [`spawn_actor`], but also stops when `shutdown` fires. Messages
/// already being handled run to completion.
pub fn spawn_actor_with_shutdown<A: Actor>(
    actor: A,
    capacity: usize,
    shutdown: Option<broadcast::Receiver<()>>,
) -> ActorHandle<A> {
    let (tx, rx) = mpsc::channel::<A::Msg>(capacity.max(1));
    let addr = Addr(tx);
    let ctx = Context {
        stop: false,
        _actor: PhantomData,
    };
    let task = tokio::spawn(run(actor, rx, ctx, shutdown));
    ActorHandle { addr, task }
}

async fn run<A: Actor>(
    mut actor: A,
    mut rx: mpsc::Receiver<A::Msg>,
    mut ctx: Context<A>,
    mut shutdown: Option<broadcast::Receiver<()>>,
) -> Result<()> {
    loop {
        let msg = match shutdown.as_mut() {
            Some(shutdown_rx) => tokio::select! {
                _ = shutdown_rx.recv() => break,
                msg = rx.recv() => msg,
            },
            None => rx.recv().await,
        };
        let Some(msg) = msg else { break };

        if let Err(e) = actor.handle(msg, &mut ctx).await {
            tracing::error!(target: "textease::actors", error = ?e, "actor returned error; stopping");
            return Err(e);
        }
        if ctx.stop {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Idle;

    #[async_trait::async_trait]
    impl Actor for Idle {
        type Msg = ();
        async fn handle(&mut self, _msg: (), _ctx: &mut Context<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn dropping_every_address_stops_the_actor() {
        let ActorHandle { addr, task } = spawn_actor(Idle, 1);
        addr.send(()).await.unwrap();
        drop(addr);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_signal_stops_the_actor() {
        let (shutdown, rx) = broadcast::channel(1);
        let ActorHandle { addr, task } = spawn_actor_with_shutdown(Idle, 1, Some(rx));
        shutdown.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert!(addr.is_closed());
    }
}
