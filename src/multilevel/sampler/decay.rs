//! Counter driven schedules for sampling biases

/// `(upper - lower) * exp(-lambda * n) + lower` for the n-th call
#[derive(Debug, Clone)]
pub struct ExponentialDecay {
    lambda: f64,
    upper: f64,
    lower: f64,
    counter: u64,
}

impl ExponentialDecay {
    pub fn new(lambda: f64, upper: f64, lower: f64) -> Self {
        ExponentialDecay {
            lambda,
            upper,
            lower,
            counter: 0,
        }
    }

    /// Value for the current counter, without advancing
    pub fn peek(&self) -> f64 {
        (self.upper - self.lower) * (-self.lambda * self.counter as f64).exp() + self.lower
    }

    /// Value for the current counter, then advance
    pub fn next_value(&mut self) -> f64 {
        let value = self.peek();
        self.counter += 1;
        value
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

/// Linear ramp from `value_init` at `counter_init` to `value_target` at
/// `counter_target`, constant afterwards
#[derive(Debug, Clone)]
pub struct LinearDecay {
    value_init: f64,
    value_target: f64,
    counter_init: u64,
    counter_target: u64,
    counter: u64,
}

impl LinearDecay {
    pub fn new(value_init: f64, value_target: f64, counter_init: u64, counter_target: u64) -> Self {
        LinearDecay {
            value_init,
            value_target,
            counter_init,
            counter_target,
            counter: counter_init,
        }
    }

    pub fn peek(&self) -> f64 {
        if self.counter >= self.counter_target || self.counter_target <= self.counter_init {
            return self.value_target;
        }
        let t = (self.counter - self.counter_init) as f64
            / (self.counter_target - self.counter_init) as f64;
        self.value_init + t * (self.value_target - self.value_init)
    }

    pub fn next_value(&mut self) -> f64 {
        let value = self.peek();
        self.counter += 1;
        value
    }

    pub fn reset(&mut self) {
        self.counter = self.counter_init;
    }
}
