use markov_grid::*;

#[allow(dead_code)]
pub const DEFAULT_WORLD: &str = r#"
    title = "default"
    size = [4, 3]
    reward = -0.04
    gamma = 1
    epsilon = 0.2
    probability = [0.8, 0.1, 0.1, 0.0]

    [[state]]
        s_type = 'S'
        position = [0, 0]

    [[state]]
        s_type = 'T'
        position = [3, 2]
        value = 1

    [[state]]
        s_type = 'T'
        position = [3, 1]
        value = -1

    [[state]]
        s_type = 'F'
        position = [1, 1]
"#;

#[allow(dead_code)]
pub fn default_world() -> GridWorld {
    world_from(DEFAULT_WORLD)
}

#[allow(dead_code)]
pub fn world_from(content: &str) -> GridWorld {
    let desc = BoardDescription::from_toml_str(content).unwrap();
    GridWorld::from_description(&desc).unwrap()
}

#[allow(dead_code)]
pub fn value_at(world: &GridWorld, x: usize, y: usize) -> f64 {
    world[Position::new(x, y)].value().unwrap()
}
