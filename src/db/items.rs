use super::{Files, State};
use crate::config::Writer;
use crate::tech::node::{ItemType, ListTag};

fn separator(out: &mut Writer, kind: ItemType) {
    out.write(&format!("\n// {}\n", kind));
}

fn bounds_end(out: &mut Writer, kind: ItemType, atom: i64) {
    out.write(&format!(
        "  items_{}_last = 0x{:02x},\n  items_{}_len = items_{}_last - items_{}_first,\n",
        kind, atom, kind, kind, kind
    ));
}

/// sort the items into their enum order, hand out the 1-based atom
/// values and emit the item enum, the registration table and the ui
/// list fragments
pub fn generate(state: &mut State, files: &mut Files) {
    state.info.sort_by(|lhs, rhs| {
        lhs.kind
            .cmp(&rhs.kind)
            .then(lhs.order.cmp(&rhs.order))
            .then_with(|| {
                if !lhs.kind.elem() {
                    lhs.layer.cmp(&rhs.layer)
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .then(lhs.name.cmp(&rhs.name))
    });

    let mut current: Option<ItemType> = None;
    let len = state.info.len();

    for i in 0..len {
        let atom = (i + 1) as i64;
        state.info[i].atom = atom;

        let info = state.info[i].clone();
        if !state.atoms.set(&info.name, atom) {
            state.errs.push(format!("duplicate item: {}", info.name));
        }

        if current != Some(info.kind) {
            if let Some(kind) = current {
                bounds_end(&mut files.item, kind, atom);
            }
            current = Some(info.kind);

            separator(&mut files.item, info.kind);
            separator(&mut files.im_register, info.kind);
            files.item.write(&format!(
                "  items_{}_first = 0x{:02x},\n",
                info.kind, atom
            ));
        }

        let sym = info.name.to_enum();

        files.item.write(&format!(
            "  item_{:<30} = 0x{:02x},\n",
            sym.as_str(),
            atom
        ));

        if info.kind != ItemType::Active {
            files.im_register.write(&format!(
                "im_register(item_{}, \"{}\", {}, \"item-{}\"),\n",
                sym, info.name, info.name.len(), info.name
            ));
        } else if !info.config.is_empty() {
            files.im_register.write(&format!(
                "im_register_cfg(item_{}, \"{}\", {}, \"item-{}\", im_{}_config),\n",
                sym, info.name, info.name.len(), info.name, info.config
            ));
        } else {
            files.im_register.write(&format!(
                "im_register_cfg(item_{}, \"{}\", {}, \"item-{}\", im_{}_config),\n",
                sym, info.name, info.name.len(), info.name, sym
            ));
            files.im_includes.write(&format!(
                "#include \"items/{}/{}.h\"\n",
                sym, sym
            ));
        }

        if info.list == ListTag::Control {
            files.im_control.write(&format!("item_{},\n", sym));
        }
        if info.list == ListTag::Factory {
            files.im_factory.write(&format!("item_{},\n", sym));
        }

        if i == len - 1 {
            bounds_end(&mut files.item, info.kind, atom + 1);
        }
    }

    files
        .item
        .write(&format!("\n  items_max = 0x{:02x},\n", len + 1));
}
