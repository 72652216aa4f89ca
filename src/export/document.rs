//! glTF JSON document assembly.
//!
//! Runs after the analysis join: every image's final output swizzle is known
//! by the time its record is serialized. The document only reads the bake
//! caches; nothing here mutates state.

use serde_json::{json, Map, Value};

use super::EmittedNode;
use crate::bake::BakeState;
use crate::scene::{
    CameraProjection, DrawPipeline, LightKind, MeshAttribute, SceneInformation,
};
use crate::util::{Quat, Vec3, Vec4};

/// glTF attribute key for a mesh attribute slot.
fn semantic(attr: MeshAttribute) -> &'static str {
    match attr {
        MeshAttribute::Position => "POSITION",
        MeshAttribute::Normal => "NORMAL",
        MeshAttribute::Tangent => "TANGENT",
        MeshAttribute::Uv => "TEXCOORD_0",
        MeshAttribute::VertexColor => "COLOR_0",
        MeshAttribute::BoneIndex => "JOINTS_0",
        MeshAttribute::BoneWeights => "WEIGHTS_0",
    }
}

pub(crate) fn build_document(
    scene: &SceneInformation,
    state: &BakeState<'_>,
    nodes: &[EmittedNode],
) -> Value {
    let mut doc = Map::new();

    doc.insert(
        "asset".into(),
        json!({
            "generator": concat!("glb-export glTF 2.0 exporter ", env!("CARGO_PKG_VERSION")),
            "version": "2.0",
        }),
    );

    if !scene.lights.is_empty() {
        doc.insert("extensionsRequired".into(), json!(["KHR_lights_cmn"]));
        doc.insert("extensionsUsed".into(), json!(["KHR_lights_cmn"]));
    }

    doc.insert("nodes".into(), build_nodes(nodes));

    doc.insert(
        "buffers".into(),
        json!([{ "byteLength": state.buffers.blob().len() }]),
    );

    let views: Vec<Value> = state
        .buffers
        .views()
        .iter()
        .map(|view| {
            json!({
                "buffer": 0,
                "byteLength": view.length,
                "byteOffset": view.offset,
                "byteStride": view.stride,
            })
        })
        .collect();
    doc.insert("bufferViews".into(), Value::Array(views));

    doc.insert("accessors".into(), build_accessors(state));
    doc.insert("samplers".into(), build_samplers(state));
    doc.insert("images".into(), build_images(state));

    let textures: Vec<Value> = state
        .textures
        .textures()
        .iter()
        .map(|texture| json!({ "sampler": texture.sampler, "source": texture.image }))
        .collect();
    doc.insert("textures".into(), Value::Array(textures));

    doc.insert("materials".into(), build_materials(state));
    doc.insert("meshes".into(), build_meshes(state));
    doc.insert("cameras".into(), build_cameras(scene));

    if !scene.lights.is_empty() {
        doc.insert(
            "extensions".into(),
            json!({ "KHR_lights_cmn": { "lights": build_lights(scene) } }),
        );
    }

    if !state.environments.is_empty() {
        doc.insert(
            "extras".into(),
            json!({ "environments": build_environments(state) }),
        );
    }

    Value::Object(doc)
}

fn build_nodes(nodes: &[EmittedNode]) -> Value {
    let mut values = Vec::with_capacity(nodes.len());
    for node in nodes {
        let mut n = Map::new();

        if !node.children.is_empty() {
            n.insert("children".into(), json!(node.children));
        }
        if let Some(group) = node.mesh_group {
            n.insert("mesh".into(), json!(group));
        }
        if let Some(camera) = node.camera {
            n.insert("camera".into(), json!(camera));
        }
        if let Some(light) = node.light {
            n.insert(
                "extensions".into(),
                json!({ "KHR_lights_cmn": { "light": light } }),
            );
        }

        // Transform fields only when non-identity.
        let t = &node.transform;
        if t.rotation != Quat::IDENTITY {
            n.insert(
                "rotation".into(),
                json!([t.rotation.x, t.rotation.y, t.rotation.z, t.rotation.w]),
            );
        }
        if t.scale != Vec3::ONE {
            n.insert("scale".into(), json!([t.scale.x, t.scale.y, t.scale.z]));
        }
        if t.translation != Vec3::ZERO {
            n.insert(
                "translation".into(),
                json!([t.translation.x, t.translation.y, t.translation.z]),
            );
        }

        values.push(Value::Object(n));
    }
    Value::Array(values)
}

fn build_accessors(state: &BakeState<'_>) -> Value {
    let mut values = Vec::new();
    for accessor in state.buffers.accessors() {
        let mut acc = Map::new();
        acc.insert("bufferView".into(), json!(accessor.view));
        acc.insert("componentType".into(), json!(accessor.component));
        acc.insert("type".into(), json!(accessor.type_name));
        acc.insert("count".into(), json!(accessor.count));
        acc.insert("byteOffset".into(), json!(accessor.offset));

        if let Some(aabb) = accessor.aabb {
            let components = match accessor.type_name {
                "SCALAR" => 1,
                "VEC2" => 2,
                "VEC3" => 3,
                "VEC4" => 4,
                _ => 0,
            };
            if components > 0 {
                let lo = [aabb.min.x, aabb.min.y, aabb.min.z, 1.0];
                let hi = [aabb.max.x, aabb.max.y, aabb.max.z, 1.0];
                acc.insert("min".into(), json!(lo[..components].to_vec()));
                acc.insert("max".into(), json!(hi[..components].to_vec()));
            }
        }
        values.push(Value::Object(acc));
    }
    Value::Array(values)
}

fn build_samplers(state: &BakeState<'_>) -> Value {
    let values: Vec<Value> = state
        .textures
        .samplers()
        .iter()
        .map(|sampler| {
            json!({
                "magFilter": sampler.mag_filter,
                "minFilter": sampler.min_filter,
                "wrapS": sampler.wrap_s,
                "wrapT": sampler.wrap_t,
            })
        })
        .collect();
    Value::Array(values)
}

fn build_images(state: &BakeState<'_>) -> Value {
    let mut values = Vec::new();
    for image in state.textures.images() {
        let mut i = Map::new();
        i.insert("uri".into(), json!(image.target_relpath));
        i.insert("mimeType".into(), json!(image.target_mime));

        // The analyzer may have replaced the swizzle with something else.
        let swizzle = image
            .analysis
            .as_ref()
            .map(|a| a.swizzle)
            .unwrap_or(image.swizzle);
        if !swizzle.is_identity() {
            i.insert("extras".into(), json!({ "swizzle": swizzle.gltf_codes() }));
        }
        values.push(Value::Object(i));
    }
    Value::Array(values)
}

fn build_materials(state: &BakeState<'_>) -> Value {
    let mut values = Vec::new();
    for material in &state.materials {
        let mut m = Map::new();

        match material.pipeline {
            DrawPipeline::AlphaBlend => {
                m.insert("alphaMode".into(), json!("BLEND"));
            }
            DrawPipeline::AlphaTest => {
                m.insert("alphaMode".into(), json!("MASK"));
            }
            DrawPipeline::Opaque => {}
        }

        if material.two_sided {
            m.insert("doubleSided".into(), json!(true));
        }

        if material.uniform_emissive_color != Vec3::ZERO {
            let e = material.uniform_emissive_color;
            m.insert("emissiveFactor".into(), json!([e.x, e.y, e.z]));
        }

        let mut pbr = Map::new();
        if material.uniform_roughness != 1.0 {
            pbr.insert("roughnessFactor".into(), json!(material.uniform_roughness));
        }
        if material.uniform_metallic != 1.0 {
            pbr.insert("metallicFactor".into(), json!(material.uniform_metallic));
        }
        if material.uniform_base_color != Vec4::ONE {
            let c = material.uniform_base_color;
            pbr.insert("baseColorFactor".into(), json!([c.x, c.y, c.z, c.w]));
        }
        if let Some(base_color) = material.base_color {
            pbr.insert("baseColorTexture".into(), json!({ "index": base_color }));
        }
        if let Some(metallic_roughness) = material.metallic_roughness {
            pbr.insert(
                "metallicRoughnessTexture".into(),
                json!({ "index": metallic_roughness }),
            );
        }
        m.insert("pbrMetallicRoughness".into(), Value::Object(pbr));

        if let Some(normal) = material.normal {
            // Normals are channel-packed by the compression planner, so
            // consumers must reconstruct Z.
            m.insert(
                "normalTexture".into(),
                json!({
                    "extras": { "twoComponent": true },
                    "index": normal,
                    "scale": material.normal_scale,
                }),
            );
        }
        if let Some(emissive) = material.emissive {
            m.insert("emissiveTexture".into(), json!({ "index": emissive }));
        }
        if let Some(occlusion) = material.occlusion {
            m.insert("occlusionTexture".into(), json!({ "index": occlusion }));
        }

        values.push(Value::Object(m));
    }
    Value::Array(values)
}

fn build_meshes(state: &BakeState<'_>) -> Value {
    let mut values = Vec::new();
    for group in state.mesh_groups.values() {
        let mut primitives = Vec::with_capacity(group.len());
        for &submesh in group {
            let mesh = &state.meshes[submesh as usize];
            let mut prim = Map::new();
            let mut attributes = Map::new();

            for attr in MeshAttribute::ALL {
                if let Some(accessor) = mesh.attribute_accessors[attr as usize] {
                    attributes.insert(semantic(attr).into(), json!(accessor));
                }
            }

            if let Some(indices) = mesh.index_accessor {
                prim.insert("indices".into(), json!(indices));
            }
            if let Some(material) = mesh.material {
                prim.insert("material".into(), json!(state.material.remap(material)));
            }
            prim.insert("attributes".into(), Value::Object(attributes));
            primitives.push(Value::Object(prim));
        }

        values.push(json!({ "primitives": primitives }));
    }
    Value::Array(values)
}

fn build_cameras(scene: &SceneInformation) -> Value {
    let mut values = Vec::with_capacity(scene.cameras.len());
    for camera in &scene.cameras {
        let cam = match camera.projection {
            CameraProjection::Perspective {
                aspect_ratio,
                yfov,
                znear,
                zfar,
            } => json!({
                "type": "perspective",
                "perspective": {
                    "aspectRatio": aspect_ratio,
                    "yfov": yfov,
                    "znear": znear,
                    "zfar": zfar,
                },
            }),
            CameraProjection::Orthographic {
                xmag,
                ymag,
                znear,
                zfar,
            } => json!({
                "type": "orthographic",
                "orthographic": {
                    "xmag": xmag,
                    "ymag": ymag,
                    "znear": znear,
                    "zfar": zfar,
                },
            }),
        };
        values.push(cam);
    }
    Value::Array(values)
}

fn build_lights(scene: &SceneInformation) -> Value {
    let mut values = Vec::with_capacity(scene.lights.len());
    for light in &scene.lights {
        let mut l = Map::new();
        l.insert(
            "color".into(),
            json!([light.color.x, light.color.y, light.color.z]),
        );

        let mut positional = Map::new();
        if light.constant_falloff != 0.0 {
            positional.insert("constantAttenuation".into(), json!(light.constant_falloff));
        }
        if light.linear_falloff != 0.0 {
            positional.insert("linearAttenuation".into(), json!(light.linear_falloff));
        }
        if light.quadratic_falloff != 0.0 {
            positional.insert("quadraticAttenuation".into(), json!(light.quadratic_falloff));
        }

        match light.kind {
            LightKind::Spot {
                inner_cone,
                outer_cone,
            } => {
                l.insert("type".into(), json!("spot"));
                l.insert("profile".into(), json!("CMN"));
                // Cones arrive as cosines; the document wants sines.
                positional.insert(
                    "spot".into(),
                    json!({
                        "innerAngle": (1.0 - inner_cone * inner_cone).max(0.0).sqrt(),
                        "outerAngle": (1.0 - outer_cone * outer_cone).max(0.0).sqrt(),
                    }),
                );
                l.insert("positional".into(), Value::Object(positional));
            }
            LightKind::Point => {
                l.insert("type".into(), json!("point"));
                l.insert("profile".into(), json!("CMN"));
                l.insert("positional".into(), Value::Object(positional));
            }
            LightKind::Directional => {
                l.insert("type".into(), json!("directional"));
                l.insert("profile".into(), json!("CMN"));
            }
            LightKind::Ambient => {
                l.insert("type".into(), json!("ambient"));
            }
        }

        values.push(Value::Object(l));
    }
    Value::Array(values)
}

fn build_environments(state: &BakeState<'_>) -> Value {
    let mut values = Vec::with_capacity(state.environments.len());
    for env in &state.environments {
        let mut e = Map::new();
        if let Some(cube) = env.cube {
            e.insert("cubeTexture".into(), json!(cube));
        }
        if let Some(reflection) = env.reflection {
            e.insert("reflectionTexture".into(), json!(reflection));
        }
        if let Some(irradiance) = env.irradiance {
            e.insert("irradianceTexture".into(), json!(irradiance));
        }
        e.insert("intensity".into(), json!(env.intensity));
        e.insert(
            "fog".into(),
            json!({
                "color": [env.fog_color.x, env.fog_color.y, env.fog_color.z],
                "falloff": env.fog_falloff,
            }),
        );
        values.push(Value::Object(e));
    }
    Value::Array(values)
}
