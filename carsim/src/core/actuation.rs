/// Throttle commands inside (-DEADZONE, DEADZONE) do not move the motor.
pub const POWER_DEADZONE: f64 = 18.0;

/// Braking power applied against forward motion before engaging reverse.
pub const COUNTER_THRUST_POWER: f64 = -30.0;

/// Servo units below this magnitude map to a zero wheel angle.
const SERVO_EPS: f64 = 1e-9;

/// servo_to_angle converts a raw servo command into a front wheel angle in
/// degrees. The quadratic was fitted on the physical steering linkage; it is
/// applied to the magnitude and the sign of the command is restored, so the
/// curve is symmetric. A zero command is exactly zero, not the 2.23° offset.
pub fn servo_to_angle(servo: f64) -> f64 {
    if servo.abs() < SERVO_EPS {
        return 0.0;
    }
    let s = servo.abs();
    let angle = 0.03 * s * s + 0.97 * s + 2.23;
    if servo < 0.0 {
        -angle
    } else {
        angle
    }
}

/// clip_steer clamps a raw servo command to the mechanical range [-10, 10].
pub fn clip_steer(servo: f64) -> f64 {
    servo.max(-10.0).min(10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReversePhase {
    CounterThrust,
    Freewheel,
}

#[derive(Debug, Clone, Copy)]
struct PendingReverse {
    phase: ReversePhase,
    ticks_left: u32,
    target: f64,
}

/// PowerSequencer maps throttle commands onto motor power.
///
/// Commands in the deadzone stop the motor, forward commands pass through,
/// and a reverse command issued while the motor still pushes forward runs a
/// motor-protection sequence: counter-thrust, then freewheel, then the
/// requested reverse power. The sequence advances one phase per `tick` call
/// instead of blocking, so the drive loop stays in control of time. While a
/// sequence is pending, new commands are ignored.
///
/// Every power change is reported through the `speed_fn` callback, which
/// stands in for the motor controller.
#[derive(Debug)]
pub struct PowerSequencer {
    max_power: f64,
    counter_ticks: u32,
    freewheel_ticks: u32,
    pending: Option<PendingReverse>,
}

impl PowerSequencer {
    /// A sequencer with one tick per reverse phase.
    pub fn new(max_power: f64) -> PowerSequencer {
        PowerSequencer::with_phase_ticks(max_power, 1, 1)
    }

    pub fn with_phase_ticks(max_power: f64, counter_ticks: u32, freewheel_ticks: u32) -> PowerSequencer {
        PowerSequencer {
            max_power,
            counter_ticks: counter_ticks.max(1),
            freewheel_ticks: freewheel_ticks.max(1),
            pending: None,
        }
    }

    /// True while a reverse sequence still has phases to run.
    pub fn pending(&self) -> bool {
        self.pending.is_some()
    }

    /// apply_power processes one throttle command against the current power
    /// and returns the new power. Out-of-range commands leave the power
    /// unchanged; commands arriving during a pending reverse sequence are
    /// dropped.
    pub fn apply_power<F>(&mut self, requested: f64, current: f64, speed_fn: &mut F) -> f64
    where
        F: FnMut(f64),
    {
        if self.pending.is_some() {
            return current;
        }
        if !requested.is_finite() || requested.abs() > self.max_power {
            return current;
        }

        if requested.abs() < POWER_DEADZONE {
            speed_fn(0.0);
            return 0.0;
        }

        if requested > 0.0 {
            speed_fn(requested);
            return requested;
        }

        // Reverse band. Going from forward drive straight to reverse would
        // stall the motor, so brake and coast first.
        if current > 0.0 {
            self.pending = Some(PendingReverse {
                phase: ReversePhase::CounterThrust,
                ticks_left: self.counter_ticks,
                target: requested,
            });
            speed_fn(COUNTER_THRUST_POWER);
            COUNTER_THRUST_POWER
        } else {
            speed_fn(requested);
            requested
        }
    }

    /// tick advances a pending reverse sequence by one tick and returns the
    /// (possibly unchanged) power. With no sequence pending this is a no-op.
    pub fn tick<F>(&mut self, current: f64, speed_fn: &mut F) -> f64
    where
        F: FnMut(f64),
    {
        let mut state = match self.pending {
            Some(state) => state,
            None => return current,
        };

        state.ticks_left = state.ticks_left.saturating_sub(1);
        if state.ticks_left > 0 {
            self.pending = Some(state);
            return current;
        }

        match state.phase {
            ReversePhase::CounterThrust => {
                self.pending = Some(PendingReverse {
                    phase: ReversePhase::Freewheel,
                    ticks_left: self.freewheel_ticks,
                    target: state.target,
                });
                speed_fn(0.0);
                0.0
            }
            ReversePhase::Freewheel => {
                self.pending = None;
                speed_fn(state.target);
                state.target
            }
        }
    }
}
