//! Keyboard routing.
//!
//! Key presses are delivered to an [`InputRouter`]; interested parties
//! subscribe a listener and keep the returned [`Subscription`] alive for as long
//! as they want to hear about keys. Dropping the subscription removes the
//! listener, so there are no handlers left behind after teardown.
//!
//! Listeners do not act on the world themselves: they translate a key into a
//! [`Command`] which the owner of the scene applies.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use winit::keyboard::{KeyCode, ModifiersState};

use crate::backend::SceneId;

/// Modifier keys held while a key went down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

impl From<ModifiersState> for Modifiers {
    fn from(state: ModifiersState) -> Self {
        Self {
            shift: state.shift_key(),
            ctrl: state.control_key(),
            alt: state.alt_key(),
            meta: state.super_key(),
        }
    }
}

/// A key going down, with the modifiers held at that moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }
}

/// A key plus an exact set of required modifiers.
///
/// Extra modifiers beyond the required ones are tolerated, missing ones are not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyCombo {
    /// Shift+Control+Alt+I (legacy DOM key code 73).
    ///
    /// Matched on the physical key, i.e. the position of `I` on a US QWERTY
    /// board. On other layouts (Dvorak, AZERTY) the key that types "I" may
    /// differ and the combo stays on the QWERTY position.
    pub const INSPECTOR: KeyCombo = KeyCombo {
        code: KeyCode::KeyI,
        shift: true,
        ctrl: true,
        alt: true,
    };

    pub fn matches(&self, key: &KeyPress) -> bool {
        key.code == self.code
            && (!self.shift || key.modifiers.shift)
            && (!self.ctrl || key.modifiers.ctrl)
            && (!self.alt || key.modifiers.alt)
    }
}

/// What a listener wants done in response to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show or hide the debug inspector of a scene.
    ToggleInspector(SceneId),
}

pub type Listener = Box<dyn FnMut(&KeyPress) -> Option<Command>>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Fan-out of key presses to subscribed listeners.
///
/// Single-threaded: the router lives on the event-loop thread together with
/// everything it dispatches to.
#[derive(Clone, Default)]
pub struct InputRouter {
    listeners: Rc<RefCell<Listeners>>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, listener));
        log::debug!("key listener {id} subscribed");
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Delivers `key` to every listener in subscription order and collects the
    /// commands they produced.
    pub fn dispatch(&self, key: &KeyPress) -> Vec<Command> {
        self.listeners
            .borrow_mut()
            .entries
            .iter_mut()
            .filter_map(|(_, listener)| listener(key))
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

impl std::fmt::Debug for InputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputRouter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its listener immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|l| l.borrow().entries.iter().any(|(id, _)| *id == self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().entries.retain(|(id, _)| *id != self.id);
            log::debug!("key listener {} unsubscribed", self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Listener that emits `command` whenever `combo` is pressed.
pub fn hotkey(combo: KeyCombo, command: Command) -> Listener {
    Box::new(move |key| combo.matches(key).then_some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: SceneId = SceneId::from_index(0);

    const ALL: Modifiers = Modifiers {
        shift: true,
        ctrl: true,
        alt: true,
        meta: false,
    };

    #[test]
    fn inspector_combo_requires_all_three_modifiers() {
        let combo = KeyCombo::INSPECTOR;
        assert!(combo.matches(&KeyPress::new(KeyCode::KeyI, ALL)));
        assert!(!combo.matches(&KeyPress::new(KeyCode::KeyI, Modifiers::NONE)));
        assert!(!combo.matches(&KeyPress::new(
            KeyCode::KeyI,
            Modifiers {
                alt: false,
                ..ALL
            }
        )));
        assert!(!combo.matches(&KeyPress::new(KeyCode::KeyJ, ALL)));
    }

    #[test]
    fn inspector_combo_follows_the_qwerty_position() {
        // Dvorak types "I" on the physical G key.
        assert!(!KeyCombo::INSPECTOR.matches(&KeyPress::new(KeyCode::KeyG, ALL)));
        assert!(KeyCombo::INSPECTOR.matches(&KeyPress::new(KeyCode::KeyI, ALL)));
    }

    #[test]
    fn extra_modifiers_are_tolerated() {
        let key = KeyPress::new(KeyCode::KeyI, Modifiers { meta: true, ..ALL });
        assert!(KeyCombo::INSPECTOR.matches(&key));
    }

    #[test]
    fn dispatch_collects_commands() {
        let router = InputRouter::new();
        let _sub = router.subscribe(hotkey(KeyCombo::INSPECTOR, Command::ToggleInspector(SCENE)));
        assert_eq!(
            router.dispatch(&KeyPress::new(KeyCode::KeyI, ALL)),
            vec![Command::ToggleInspector(SCENE)]
        );
        assert!(router.dispatch(&KeyPress::new(KeyCode::KeyA, ALL)).is_empty());
    }

    #[test]
    fn dropping_subscription_removes_listener() {
        let router = InputRouter::new();
        let sub = router.subscribe(hotkey(KeyCombo::INSPECTOR, Command::ToggleInspector(SCENE)));
        let other = router.subscribe(Box::new(|_| None));
        assert_eq!(router.listener_count(), 2);
        assert!(sub.is_active());

        drop(sub);
        assert_eq!(router.listener_count(), 1);
        assert!(router.dispatch(&KeyPress::new(KeyCode::KeyI, ALL)).is_empty());
        assert!(other.is_active());
    }

    #[test]
    fn subscription_outliving_router_is_harmless() {
        let router = InputRouter::new();
        let sub = router.subscribe(Box::new(|_| None));
        drop(router);
        assert!(!sub.is_active());
        drop(sub);
    }

    #[test]
    fn modifiers_from_winit_state() {
        let state = ModifiersState::SHIFT | ModifiersState::CONTROL | ModifiersState::ALT;
        assert_eq!(Modifiers::from(state), ALL);
    }
}
