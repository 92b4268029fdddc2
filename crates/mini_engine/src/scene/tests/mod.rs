//! Scene construction tests spanning the loader, graph and resources
