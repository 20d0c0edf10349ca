use prioritizer_core::{update, AppState, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn idle_reveal_tick_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(
        state.clone(),
        Msg::TimerFired(prioritizer_core::Timer::Reveal { generation: 0 }),
    );

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
