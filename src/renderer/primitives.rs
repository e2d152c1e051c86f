use crate::asset::{v, Mesh, Vertex};

pub fn cube_mesh() -> (Vec<Vertex>, Vec<u32>) {
    let p = |x, y, z| [x, y, z];

    let verts = vec![
        // Right face (+X), normal in +X
        v(p(0.5, -0.5, -0.5), [1.0, 0.0, 0.0], [0.0, 1.0]),
        v(p(0.5, 0.5, -0.5), [1.0, 0.0, 0.0], [0.0, 0.0]),
        v(p(0.5, 0.5, 0.5), [1.0, 0.0, 0.0], [1.0, 0.0]),
        v(p(0.5, -0.5, 0.5), [1.0, 0.0, 0.0], [1.0, 1.0]),
        // Left face (-X), normal in -X
        v(p(-0.5, -0.5, 0.5), [-1.0, 0.0, 0.0], [0.0, 1.0]),
        v(p(-0.5, 0.5, 0.5), [-1.0, 0.0, 0.0], [0.0, 0.0]),
        v(p(-0.5, 0.5, -0.5), [-1.0, 0.0, 0.0], [1.0, 0.0]),
        v(p(-0.5, -0.5, -0.5), [-1.0, 0.0, 0.0], [1.0, 1.0]),
        // Top face (+Y), normal in +Y
        v(p(-0.5, 0.5, -0.5), [0.0, 1.0, 0.0], [0.0, 1.0]),
        v(p(-0.5, 0.5, 0.5), [0.0, 1.0, 0.0], [0.0, 0.0]),
        v(p(0.5, 0.5, 0.5), [0.0, 1.0, 0.0], [1.0, 0.0]),
        v(p(0.5, 0.5, -0.5), [0.0, 1.0, 0.0], [1.0, 1.0]),
        // Bottom face (-Y), normal in -Y
        v(p(-0.5, -0.5, 0.5), [0.0, -1.0, 0.0], [0.0, 1.0]),
        v(p(-0.5, -0.5, -0.5), [0.0, -1.0, 0.0], [0.0, 0.0]),
        v(p(0.5, -0.5, -0.5), [0.0, -1.0, 0.0], [1.0, 0.0]),
        v(p(0.5, -0.5, 0.5), [0.0, -1.0, 0.0], [1.0, 1.0]),
        // Front face (+Z), normal in +Z
        v(p(0.5, -0.5, 0.5), [0.0, 0.0, 1.0], [0.0, 1.0]),
        v(p(0.5, 0.5, 0.5), [0.0, 0.0, 1.0], [0.0, 0.0]),
        v(p(-0.5, 0.5, 0.5), [0.0, 0.0, 1.0], [1.0, 0.0]),
        v(p(-0.5, -0.5, 0.5), [0.0, 0.0, 1.0], [1.0, 1.0]),
        // Back face (-Z), normal in -Z
        v(p(-0.5, -0.5, -0.5), [0.0, 0.0, -1.0], [0.0, 1.0]),
        v(p(-0.5, 0.5, -0.5), [0.0, 0.0, -1.0], [0.0, 0.0]),
        v(p(0.5, 0.5, -0.5), [0.0, 0.0, -1.0], [1.0, 0.0]),
        v(p(0.5, -0.5, -0.5), [0.0, 0.0, -1.0], [1.0, 1.0]),
    ];

    let idx = (0..6)
        .flat_map(|f| {
            let o = f * 4;
            [o, o + 1, o + 2, o, o + 2, o + 3]
        })
        .map(|i| i as u32)
        .collect::<Vec<_>>();

    (verts, idx)
}

/// Unit quad in the XY plane facing +Z, used as portal aperture geometry.
pub fn quad_mesh() -> (Vec<Vertex>, Vec<u32>) {
    let normal = [0.0, 0.0, 1.0];
    let verts = vec![
        v([-0.5, -0.5, 0.0], normal, [0.0, 1.0]),
        v([0.5, -0.5, 0.0], normal, [1.0, 1.0]),
        v([0.5, 0.5, 0.0], normal, [1.0, 0.0]),
        v([-0.5, 0.5, 0.0], normal, [0.0, 0.0]),
    ];
    (verts, vec![0, 1, 2, 0, 2, 3])
}

pub fn cube() -> Mesh {
    let (vertices, indices) = cube_mesh();
    Mesh::new("Cube", vertices, indices)
}

pub fn quad() -> Mesh {
    let (vertices, indices) = quad_mesh();
    Mesh::new("Quad", vertices, indices)
}
