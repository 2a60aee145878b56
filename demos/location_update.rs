//! Demo: a location update procedure with an authentication child and a
//! guard timer, driven by the tokio loop.
//!
//! Run with `RUST_LOG=debug cargo run --example location_update`.

use std::time::Duration;

use telefsm::{
    Engine, EventData, EventId, FsmBehavior, FsmDescriptor, FsmEvent, FsmStates, InstanceId, StateId, TermCause,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, FsmEvent)]
pub enum LuEvent {
    #[event(name = "LU_REQ")]
    Request,
    #[event(name = "AUTH_DONE")]
    AuthDone,
}

#[derive(Debug, Clone, Copy, FsmStates)]
#[fsm(events = LuEvent)]
pub enum LuState {
    #[state(out(Authenticating), events(Request), name = "IDLE")]
    Idle,
    #[state(out(Accepted), events(AuthDone), name = "AUTHENTICATING")]
    Authenticating,
    #[state(name = "ACCEPTED")]
    Accepted,
}

#[derive(Debug, Clone, Copy, FsmEvent)]
pub enum AuthEvent {
    #[event(name = "AUTH_RESP")]
    Response,
}

#[derive(Debug, Clone, Copy, FsmStates)]
#[fsm(events = AuthEvent)]
pub enum AuthState {
    #[state(events(Response), name = "WAIT_RESP")]
    WaitResp,
}

struct Auth;

impl FsmBehavior for Auth {
    fn action(&self, engine: &mut Engine, fi: InstanceId, _: StateId, _: EventId, _: Option<EventData>) {
        engine.terminate(fi, TermCause::Regular, None);
    }
}

struct LocationUpdate {
    auth: std::rc::Rc<FsmDescriptor>,
}

impl FsmBehavior for LocationUpdate {
    fn action(&self, engine: &mut Engine, fi: InstanceId, state: StateId, _: EventId, _: Option<EventData>) {
        match LuState::try_from(state) {
            Ok(LuState::Idle) => {
                if engine.alloc_child(&self.auth, fi, LuEvent::AuthDone).is_ok() {
                    let _ = engine.state_chg(fi, LuState::Authenticating, Duration::from_secs(5), 3250);
                }
            }
            Ok(LuState::Authenticating) => {
                let _ = engine.state_chg(fi, LuState::Accepted, Duration::ZERO, 0);
                engine.terminate(fi, TermCause::Regular, None);
            }
            _ => {}
        }
    }

    fn has_timer_cb(&self) -> bool {
        true
    }

    fn timer_cb(&self, engine: &mut Engine, fi: InstanceId) {
        engine.terminate(fi, TermCause::Error, None);
    }

    fn cleanup(&self, engine: &mut Engine, fi: InstanceId, cause: TermCause) {
        println!("{} finished: {cause}", engine.inst_name(fi));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let auth = FsmDescriptor::builder("AUTH")
        .log_subsys("DMM")
        .states::<AuthState>()
        .events::<AuthEvent>()
        .build(Auth)
        .unwrap();
    let lu = FsmDescriptor::builder("LU")
        .log_subsys("DMM")
        .states::<LuState>()
        .events::<LuEvent>()
        .build(LocationUpdate {
            auth: std::rc::Rc::clone(&auth),
        })
        .unwrap();

    let mut engine = Engine::default();
    engine.register(&auth);
    engine.register(&lu);

    // One subscriber answers, the other never does and hits T3250.
    let answering = engine.alloc(&lu, None, None, Some("imsi-001010000000001"));
    let silent = engine.alloc(&lu, None, None, Some("imsi-001010000000002"));
    engine.dispatch(answering, LuEvent::Request, None).unwrap();
    engine.dispatch(silent, LuEvent::Request, None).unwrap();
    let auth_child = engine.children(answering)[0];

    let (handle, mailbox) = telefsm::channel(32);
    let client = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.send(auth_child, AuthEvent::Response).await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        handle.shutdown_graceful();
    };

    let (engine, ()) = tokio::join!(engine.run(mailbox), client);
    println!("{} instances left", engine.live_instances());
}
