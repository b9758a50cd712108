use crate::common::types::State;

/// Cursor on a lifted path: the bundle vertex reached so far and the arc
/// length of its projection along the base path.
#[derive(Debug, Clone)]
pub struct BasePathHead {
    vertex: usize,
    state: State,
    location: f64,
    target: State,
}

impl BasePathHead {
    pub fn new(vertex: usize, state: State, target: State) -> Self {
        BasePathHead {
            vertex,
            state,
            location: 0.0,
            target,
        }
    }

    pub fn vertex(&self) -> usize {
        self.vertex
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn location(&self) -> f64 {
        self.location
    }

    /// Bundle state the lift has to reach
    pub fn target(&self) -> &State {
        &self.target
    }

    pub fn set_current(&mut self, vertex: usize, state: State, location: f64) {
        self.vertex = vertex;
        self.state = state;
        self.location = location;
    }
}
